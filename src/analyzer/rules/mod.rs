//! Per-command rule modules and head dispatch.
//!
//! The rule set is closed: every head the engine knows about is a variant of
//! [`CommandFamily`], and `dispatch` matches it exhaustively. A missed case
//! here would be a silent bypass, which is why this is an enum and not a
//! trait-object registry.

pub mod eval_source;
pub mod find;
pub mod git;
pub mod parallel;
pub mod raw;
pub mod rm;
pub mod xargs;

use std::collections::{HashMap, HashSet};

pub use super::Block;
use super::AnalysisContext;
use super::wrappers;

/// Commands whose arguments are display-only: a dangerous-looking string in
/// their argument list is data, not an invocation.
const DISPLAY_ONLY: &[&str] = &[
    "basename", "cat", "dirname", "echo", "file", "grep", "head", "less", "man", "more",
    "printf", "rg", "stat", "tail", "type", "wc", "which",
];

/// Closed set of heads the engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFamily {
    Git,
    Rm,
    Find,
    Xargs,
    Parallel,
    Eval,
    Source,
    /// `cd`, `pushd`, `popd`: handled by the cwd tracker, never blocked.
    DirChange,
    /// Arguments are data; skip the embedded-command fallback.
    DisplayOnly,
    Other,
}

impl CommandFamily {
    /// Classify a normalized (lowercased, path-stripped) head.
    pub fn classify(head: &str) -> Self {
        match head {
            "git" => Self::Git,
            "rm" => Self::Rm,
            "find" => Self::Find,
            "xargs" => Self::Xargs,
            "parallel" => Self::Parallel,
            "eval" => Self::Eval,
            "source" | "." => Self::Source,
            "cd" | "pushd" | "popd" => Self::DirChange,
            _ if DISPLAY_ONLY.contains(&head) => Self::DisplayOnly,
            _ => Self::Other,
        }
    }
}

/// Single-dash option characters, case preserved (`-fD` yields {f, D}).
pub(crate) fn short_opts(args: &[String]) -> HashSet<char> {
    let mut out = HashSet::new();
    for arg in args {
        if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 1 {
            out.extend(arg[1..].chars());
        }
    }
    out
}

/// Everything one segment's rule evaluation needs.
pub(crate) struct SegmentInput<'a> {
    pub head: &'a str,
    pub args: &'a [String],
    pub env: &'a HashMap<String, String>,
    pub cwd: Option<&'a str>,
    pub segment: &'a str,
    pub ctx: &'a AnalysisContext,
}

impl<'a> SegmentInput<'a> {
    fn rm_context(&self) -> rm::RmContext<'a> {
        rm::RmContext {
            env: self.env,
            cwd: self.cwd,
            boundary: self.ctx.cwd.as_deref(),
            home: self.ctx.home.as_deref(),
            tmpdir: self.ctx.tmpdir.as_deref(),
            paranoid: self.ctx.paranoid_rm,
        }
    }
}

/// Run the rule module for the segment's head. `recurse` re-enters the
/// analysis at depth+1 for rule modules that discover whole embedded
/// command lines (parallel's commands-list form).
pub(crate) fn dispatch(
    input: &SegmentInput<'_>,
    recurse: &dyn Fn(&str) -> Option<Block>,
) -> Option<Block> {
    match CommandFamily::classify(input.head) {
        CommandFamily::Git => git::analyze(input.args, input.segment),
        CommandFamily::Rm => rm::analyze(input.args, &input.rm_context(), input.segment),
        CommandFamily::Find => find::analyze(input.args, input.segment),
        CommandFamily::Xargs => xargs::analyze(input.args, input.segment),
        CommandFamily::Parallel => {
            parallel::analyze(input.args, &input.rm_context(), input.segment, recurse)
        }
        CommandFamily::Eval => eval_source::analyze_eval(input.args, input.segment)
            .or_else(|| embedded_command_scan(input)),
        CommandFamily::Source => eval_source::analyze_source(
            input.args,
            input.env,
            input.ctx.tmpdir.as_deref(),
            input.segment,
        )
        .or_else(|| embedded_command_scan(input)),
        CommandFamily::DirChange | CommandFamily::DisplayOnly => None,
        CommandFamily::Other => embedded_command_scan(input),
    }
}

/// Best-effort scan for an `rm`/`git`/`find` invocation buried later in the
/// token stream (`nice -n 10 rm -rf /` and friends). Heuristic by design:
/// it can match an unrelated literal argument and it only sees heads the
/// display-only list lets through.
fn embedded_command_scan(input: &SegmentInput<'_>) -> Option<Block> {
    for (i, token) in input.args.iter().enumerate() {
        let head = wrappers::normalize_head(token);
        let suffix = &input.args[i + 1..];
        let hit = match head.as_str() {
            "rm" => rm::analyze(suffix, &input.rm_context(), input.segment),
            "git" => git::analyze(suffix, input.segment),
            "find" => find::analyze(suffix, input.segment),
            _ => None,
        };
        if hit.is_some() {
            return hit;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_heads() {
        assert_eq!(CommandFamily::classify("git"), CommandFamily::Git);
        assert_eq!(CommandFamily::classify("rm"), CommandFamily::Rm);
        assert_eq!(CommandFamily::classify("."), CommandFamily::Source);
        assert_eq!(CommandFamily::classify("pushd"), CommandFamily::DirChange);
        assert_eq!(CommandFamily::classify("echo"), CommandFamily::DisplayOnly);
        assert_eq!(CommandFamily::classify("cargo"), CommandFamily::Other);
    }

    #[test]
    fn test_short_opts() {
        let args: Vec<String> = vec!["-fD".to_string(), "--force".to_string(), "x".to_string()];
        let opts = short_opts(&args);
        assert!(opts.contains(&'f'));
        assert!(opts.contains(&'D'));
        assert!(!opts.contains(&'-'));
        assert_eq!(opts.len(), 2);
    }
}
