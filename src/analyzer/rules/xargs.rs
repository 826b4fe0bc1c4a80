//! `xargs` rules.
//!
//! Whatever arrives on stdin decides what the child command operates on, so
//! the child is judged on its own: a shell child with `-c` executes stdin-
//! shaped input outright, and an `rm -rf` child deletes whatever the
//! upstream producer emits. Both are blocked regardless of target.

use super::Block;
use crate::analyzer::extract;
use crate::analyzer::wrappers;

/// xargs options that consume the next token.
const OPTS_WITH_VALUE: &[&str] = &[
    "-a", "-d", "-E", "-I", "-L", "-n", "-P", "-s", "--arg-file", "--delimiter", "--eof",
    "--max-args", "--max-chars", "--max-lines", "--max-procs", "--process-slot-var",
];

/// xargs options that stand alone. `-i`/`-e`/`-l` take an *optional*
/// attached argument, so bare forms never consume the next token.
const OPTS_NO_VALUE: &[&str] = &[
    "-0", "-e", "-i", "-l", "-o", "-p", "-r", "-t", "-x", "--null", "--open-tty",
    "--interactive", "--no-run-if-empty", "--verbose", "--exit", "--show-limits",
];

/// Index of the first child-command token.
fn child_start(args: &[String]) -> usize {
    let mut i = 0;
    while i < args.len() {
        let tok = args[i].as_str();
        if tok == "--" {
            return i + 1;
        }
        if OPTS_WITH_VALUE.contains(&tok) {
            i += 2;
            continue;
        }
        if OPTS_NO_VALUE.contains(&tok) {
            i += 1;
            continue;
        }
        // Attached forms: -I{}, -d'\n', --replace[=R], --delimiter=...
        if tok.starts_with("-I") || tok.starts_with("-i") || tok.starts_with("--replace") {
            i += 1;
            continue;
        }
        if tok.starts_with("--") && tok.contains('=') {
            i += 1;
            continue;
        }
        if tok.starts_with('-') && tok.len() > 1 {
            i += 1;
            continue;
        }
        break;
    }
    i
}

pub fn analyze(args: &[String], segment: &str) -> Option<Block> {
    let start = child_start(args);
    if start >= args.len() {
        return None;
    }

    let stripped = wrappers::strip_wrappers(&args[start..]);
    let head = stripped.tokens.first().map(|t| wrappers::normalize_head(t))?;
    let child_args = &stripped.tokens[1..];

    if extract::is_shell_launcher(&head) && extract::embedded_shell_command(child_args).is_some() {
        return Some(Block {
            reason: format!(
                "xargs piping input into '{head} -c' executes arbitrary commands built \
                 from stdin."
            ),
            segment: segment.to_string(),
        });
    }

    if head == "rm" && super::rm::has_recursive_force(child_args) {
        return Some(Block {
            reason: "xargs rm -rf deletes whatever the upstream command produces; \
                     the file list cannot be verified statically."
                .to_string(),
            segment: segment.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    fn run(args: &[&str]) -> Option<Block> {
        analyze(&toks(args), "xargs ...")
    }

    #[test]
    fn test_rm_rf_child_blocked() {
        assert!(run(&["rm", "-rf"]).is_some());
        assert!(run(&["-0", "rm", "-rf"]).is_some());
        assert!(run(&["-I", "{}", "rm", "-rf", "{}"]).is_some());
        assert!(run(&["-I{}", "rm", "-rf", "{}"]).is_some());
    }

    #[test]
    fn test_rm_without_both_flags_allowed() {
        assert!(run(&["rm", "-f"]).is_none());
        assert!(run(&["rm"]).is_none());
    }

    #[test]
    fn test_shell_child_blocked() {
        let b = run(&["bash", "-c", "echo {}"]).unwrap();
        assert!(b.reason.contains("-c"));
        assert!(run(&["-n", "1", "sh", "-c", "rm {}"]).is_some());
    }

    #[test]
    fn test_shell_child_without_dash_c_allowed() {
        assert!(run(&["bash", "script.sh"]).is_none());
    }

    #[test]
    fn test_wrapped_child_blocked() {
        assert!(run(&["sudo", "rm", "-rf"]).is_some());
        assert!(run(&["env", "A=1", "rm", "-rf"]).is_some());
    }

    #[test]
    fn test_harmless_children_allowed() {
        assert!(run(&["grep", "TODO"]).is_none());
        assert!(run(&["-n", "1", "echo"]).is_none());
        assert!(run(&[]).is_none());
    }
}
