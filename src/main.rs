use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shellguard::analyzer::AnalysisContext;
use shellguard::config::Config;
use shellguard::{Verdict, analyze, doctor, explain, hooks};

#[derive(Parser)]
#[command(name = "shellguard")]
#[command(version)]
#[command(about = "A pre-execution safety gate for AI coding agent shell commands")]
struct Args {
    /// Path to the config file (default: ~/.shellguard/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run as a host-agent hook: read a request on stdin, write the decision to stdout
    Hook {
        /// Which agent's hook protocol to speak
        #[arg(value_enum)]
        agent: Agent,
    },
    /// Analyze one command; exit 0 if allowed, 2 if blocked
    Check {
        /// The shell command to analyze
        command: String,
        /// Working directory the command would run in
        #[arg(long)]
        cwd: Option<String>,
    },
    /// Show the full analysis trace without enforcing anything
    Explain {
        /// The shell command to analyze
        command: String,
        /// Working directory the command would run in
        #[arg(long)]
        cwd: Option<String>,
    },
    /// Validate the config file and report every schema error
    VerifyConfig,
    /// Run environment and configuration diagnostics
    Doctor,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Agent {
    /// Claude Code PreToolUse hook
    Claude,
    /// Gemini CLI shell-tool hook
    Gemini,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Hook { agent } => run_hook(agent, args.config.as_deref()),
        Command::Check { command, cwd } => run_check(&command, cwd, args.config.as_deref()),
        Command::Explain { command, cwd } => {
            let context = load_context(cwd, args.config.as_deref())?;
            print!("{}", explain::render(&command, &context));
            Ok(())
        }
        Command::VerifyConfig => run_verify_config(args.config.as_deref()),
        Command::Doctor => {
            let checks = doctor::run(args.config.as_deref());
            print!("{}", doctor::render(&checks));
            if !doctor::all_passed(&checks) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load_context(
    cwd: Option<String>,
    config_path: Option<&std::path::Path>,
) -> Result<AnalysisContext> {
    let config = Config::load(config_path)?;
    let cwd = cwd.or_else(|| {
        std::env::current_dir()
            .ok()
            .map(|p| p.display().to_string())
    });
    Ok(config.build_context(cwd)?)
}

/// Hook mode never hard-fails on a broken config: a crashed hook would
/// block the whole agent, so it logs and falls open instead.
fn run_hook(agent: Agent, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, "config unusable, continuing with defaults");
            Config::default()
        }
    };

    if !config.enabled {
        if matches!(agent, Agent::Gemini) {
            println!("{}", serde_json::json!({"decision": "allow"}));
        }
        return Ok(());
    }

    let context = match config.build_context(
        std::env::current_dir()
            .ok()
            .map(|p| p.display().to_string()),
    ) {
        Ok(context) => context,
        Err(error) => {
            tracing::warn!(%error, "custom rules unusable, continuing without them");
            Config::default().build_context(None)?
        }
    };

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    match agent {
        Agent::Claude => {
            if let Some(output) = hooks::claude::respond(&input, &context) {
                println!("{output}");
            }
        }
        Agent::Gemini => {
            println!("{}", hooks::gemini::respond(&input, &context));
        }
    }
    Ok(())
}

fn run_check(
    command: &str,
    cwd: Option<String>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;
    if !config.enabled {
        eprintln!("{}", "shellguard is disabled in the config".yellow());
        return Ok(());
    }
    let cwd = cwd.or_else(|| {
        std::env::current_dir()
            .ok()
            .map(|p| p.display().to_string())
    });
    let context = config.build_context(cwd)?;

    match analyze(command, &context) {
        Verdict::Allowed => {
            eprintln!("{}", "allowed".green());
            Ok(())
        }
        Verdict::Blocked { reason, segment } => {
            eprintln!("{} {reason}", "BLOCKED:".red().bold());
            eprintln!("  segment: {segment}");
            std::process::exit(2);
        }
    }
}

fn run_verify_config(config_path: Option<&std::path::Path>) -> Result<()> {
    match Config::load(config_path).and_then(|c| c.compiled_rules()) {
        Ok(rules) => {
            println!("config ok: {} custom rule(s)", rules.len());
            Ok(())
        }
        Err(error) => {
            eprintln!("{} {error}", "config invalid:".red().bold());
            std::process::exit(1);
        }
    }
}
