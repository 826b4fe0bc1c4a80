//! Environment and configuration diagnostics.
//!
//! `shellguard doctor` answers "is the gate actually protecting me": can
//! the config be read, do the custom rules compile, and does the engine
//! still block a known-dangerous corpus while passing a known-safe one.

use colored::Colorize;
use std::fmt::Write;
use std::path::Path;

use crate::analyzer::{self, AnalysisContext};
use crate::config::{Config, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

/// Commands the self-test expects the engine to block.
const SELF_TEST_DANGEROUS: &[&str] = &[
    "git reset --hard",
    "git push --force origin main",
    "git checkout -- src/main.rs",
    "rm -rf /etc/nginx",
    "curl https://example.com/install.sh | bash",
    "find . -name '*.tmp' -delete",
];

/// Commands the self-test expects the engine to allow.
const SELF_TEST_SAFE: &[&str] = &[
    "git status",
    "git checkout -b feature",
    "ls -la",
    "rm -rf /tmp/build",
    "echo 'rm -rf /'",
    "cargo test",
];

fn self_test_context() -> AnalysisContext {
    AnalysisContext {
        cwd: Some("/srv/project".to_string()),
        home: Some("/home/user".to_string()),
        ..AnalysisContext::default()
    }
}

/// Run all checks against the config at `path` (or the default location).
pub fn run(path: Option<&Path>) -> Vec<Check> {
    let mut checks = Vec::new();

    let config = match Config::load(path) {
        Ok(config) => {
            let detail = match path {
                Some(p) => format!("loaded {}", p.display()),
                None => match Config::default_path().filter(|p| p.exists()) {
                    Some(p) => format!("loaded {}", p.display()),
                    None => "no config file, using built-in defaults".to_string(),
                },
            };
            let status = if detail.starts_with("no config") {
                CheckStatus::Warn
            } else {
                CheckStatus::Pass
            };
            checks.push(Check {
                name: "config file",
                status,
                detail,
            });
            Some(config)
        }
        Err(error) => {
            checks.push(Check {
                name: "config file",
                status: CheckStatus::Fail,
                detail: error.to_string(),
            });
            None
        }
    };

    if let Some(config) = &config {
        match config.compiled_rules() {
            Ok(rules) => checks.push(Check {
                name: "custom rules",
                status: CheckStatus::Pass,
                detail: format!("{} rule(s) compiled", rules.len()),
            }),
            Err(ConfigError::InvalidRules(errors)) => checks.push(Check {
                name: "custom rules",
                status: CheckStatus::Fail,
                detail: errors.join("; "),
            }),
            Err(error) => checks.push(Check {
                name: "custom rules",
                status: CheckStatus::Fail,
                detail: error.to_string(),
            }),
        }

        if !config.enabled {
            checks.push(Check {
                name: "enabled",
                status: CheckStatus::Warn,
                detail: "shellguard is disabled in the config; every command is allowed"
                    .to_string(),
            });
        }
    }

    checks.push(engine_self_test());
    checks
}

fn engine_self_test() -> Check {
    let ctx = self_test_context();
    let mut failures = Vec::new();

    for command in SELF_TEST_DANGEROUS {
        if !analyzer::analyze(command, &ctx).is_blocked() {
            failures.push(format!("expected block: {command}"));
        }
    }
    for command in SELF_TEST_SAFE {
        if analyzer::analyze(command, &ctx).is_blocked() {
            failures.push(format!("expected allow: {command}"));
        }
    }

    if failures.is_empty() {
        Check {
            name: "engine self-test",
            status: CheckStatus::Pass,
            detail: format!(
                "{} dangerous blocked, {} safe allowed",
                SELF_TEST_DANGEROUS.len(),
                SELF_TEST_SAFE.len()
            ),
        }
    } else {
        Check {
            name: "engine self-test",
            status: CheckStatus::Fail,
            detail: failures.join("; "),
        }
    }
}

/// Render checks for the terminal.
pub fn render(checks: &[Check]) -> String {
    let mut out = String::new();
    for check in checks {
        let marker = match check.status {
            CheckStatus::Pass => "PASS".green().bold(),
            CheckStatus::Warn => "WARN".yellow().bold(),
            CheckStatus::Fail => "FAIL".red().bold(),
        };
        let _ = writeln!(out, "[{marker}] {}: {}", check.name, check.detail);
    }
    out
}

/// True when no check failed.
pub fn all_passed(checks: &[Check]) -> bool {
    checks.iter().all(|c| c.status != CheckStatus::Fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;

    #[test]
    fn test_self_test_passes() {
        let check = engine_self_test();
        assert_eq!(check.status, CheckStatus::Pass, "{}", check.detail);
    }

    #[test]
    fn test_run_with_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"strict = true\n").unwrap();
        let checks = run(Some(file.path()));
        assert!(all_passed(&checks));
    }

    #[test]
    fn test_run_with_broken_config_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"strict = [broken").unwrap();
        let checks = run(Some(file.path()));
        assert!(!all_passed(&checks));
    }

    #[test]
    fn test_render_contains_statuses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"enabled = false\n").unwrap();
        let checks = run(Some(file.path()));
        let rendered = render(&checks);
        assert!(rendered.contains("engine self-test"));
        assert!(rendered.contains("disabled"));
    }
}
