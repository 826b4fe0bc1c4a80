//! Human-readable analysis trace.
//!
//! Renders the same analysis the hook runs, without enforcing anything:
//! the segments, their tokens, the wrappers stripped off, and which segment
//! (if any) the verdict came from.

use colored::Colorize;
use std::fmt::Write;

use crate::analyzer::rules::CommandFamily;
use crate::analyzer::tokenize::{self, Tokenized};
use crate::analyzer::{self, AnalysisContext, Verdict, wrappers};

fn family_name(family: CommandFamily) -> &'static str {
    match family {
        CommandFamily::Git => "git rules",
        CommandFamily::Rm => "rm rules",
        CommandFamily::Find => "find rules",
        CommandFamily::Xargs => "xargs rules",
        CommandFamily::Parallel => "parallel rules",
        CommandFamily::Eval => "eval rules",
        CommandFamily::Source => "source rules",
        CommandFamily::DirChange => "directory tracking",
        CommandFamily::DisplayOnly => "display-only (not scanned)",
        CommandFamily::Other => "custom rules / embedded-command scan",
    }
}

/// Render the analysis trace for one command.
pub fn render(command: &str, ctx: &AnalysisContext) -> String {
    let verdict = analyzer::analyze(command, ctx);
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", "command:".bold(), command);
    let _ = writeln!(
        out,
        "{} cwd={} strict={} paranoid_rm={} paranoid_interpreters={}",
        "context:".bold(),
        ctx.cwd.as_deref().unwrap_or("(unknown)"),
        ctx.strict,
        ctx.paranoid_rm,
        ctx.paranoid_interpreters,
    );

    let blocked_segment = match &verdict {
        Verdict::Blocked { segment, .. } => Some(segment.as_str()),
        Verdict::Allowed => None,
    };

    for (index, segment) in tokenize::split_segments(command).into_iter().enumerate() {
        let marker = if Some(segment.text.as_str()) == blocked_segment {
            " <- verdict".red().bold().to_string()
        } else {
            String::new()
        };
        let _ = writeln!(out, "\nsegment {}: {}{}", index + 1, segment.text, marker);

        match tokenize::tokenize(&segment.text) {
            Tokenized::Unparseable => {
                let note = if ctx.strict {
                    "unparseable (strict mode fails closed)"
                } else {
                    "unparseable (raw-text scan only)"
                };
                let _ = writeln!(out, "  {}", note.yellow());
            }
            Tokenized::Words(words) => {
                let stripped = wrappers::strip_wrappers(&words);
                if stripped.tokens.len() != words.len() {
                    let removed = words.len() - stripped.tokens.len();
                    let _ = writeln!(out, "  wrappers stripped: {removed} token(s)");
                }
                if !stripped.env.is_empty() {
                    let mut names: Vec<&String> = stripped.env.keys().collect();
                    names.sort();
                    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
                    let _ = writeln!(out, "  env assignments: {}", names.join(", "));
                }
                if let Some(head) = stripped.tokens.first() {
                    let head = wrappers::normalize_head(head);
                    let _ = writeln!(
                        out,
                        "  head: {} ({})",
                        head.bold(),
                        family_name(CommandFamily::classify(&head))
                    );
                }
                let _ = writeln!(out, "  tokens: {:?}", stripped.tokens);
            }
        }
    }

    match &verdict {
        Verdict::Allowed => {
            let _ = writeln!(out, "\n{}", "verdict: allowed".green().bold());
        }
        Verdict::Blocked { reason, segment } => {
            let _ = writeln!(out, "\n{}", "verdict: BLOCKED".red().bold());
            let _ = writeln!(out, "reason: {reason}");
            let _ = writeln!(out, "segment: {segment}");
        }
    }

    out
}
