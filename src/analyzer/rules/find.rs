//! `find` rules: `-delete` and destructive `-exec` payloads.
//!
//! `-delete` only counts when it appears as a real action: not as the
//! argument of an option like `-name`, and not inside an `-exec ... ;|+`
//! block where it is just an argument to the exec'd program.

use super::Block;
use crate::analyzer::wrappers;

const REASON_DELETE: &str =
    "find -delete permanently removes every matched file. Review matches with -print first.";
const REASON_EXEC_RM: &str =
    "find -exec rm with recursive+force flags deletes everything find matches.";

/// Primaries whose next token is a value, never an action.
const OPTS_WITH_VALUE: &[&str] = &[
    "-amin", "-anewer", "-atime", "-cmin", "-cnewer", "-ctime", "-fls", "-fprint", "-fprint0",
    "-gid", "-group", "-ilname", "-iname", "-inum", "-ipath", "-iregex", "-iwholename", "-links",
    "-lname", "-maxdepth", "-mindepth", "-mmin", "-mtime", "-name", "-newer", "-path", "-perm",
    "-printf", "-regex", "-regextype", "-samefile", "-size", "-type", "-uid", "-used", "-user",
    "-wholename", "-xtype", "-D",
];

/// Primaries that open an exec block, terminated by `;` or `+`.
const EXEC_OPTS: &[&str] = &["-exec", "-execdir", "-ok", "-okdir"];

pub fn analyze(args: &[String], segment: &str) -> Option<Block> {
    let mut i = 0;
    let mut exec_depth = 0usize;
    let mut exec_child: Vec<String> = Vec::new();

    while i < args.len() {
        let tok = args[i].as_str();

        if EXEC_OPTS.contains(&tok) {
            exec_depth += 1;
            i += 1;
            continue;
        }

        if exec_depth > 0 {
            if tok == ";" || tok == "+" {
                exec_depth -= 1;
                if exec_depth == 0 {
                    if let Some(block) = check_exec_child(&exec_child, segment) {
                        return Some(block);
                    }
                    exec_child.clear();
                }
            } else {
                exec_child.push(args[i].clone());
            }
            i += 1;
            continue;
        }

        if OPTS_WITH_VALUE.contains(&tok) {
            // Skip the value even if it happens to spell "-delete".
            i += 2;
            continue;
        }

        if tok == "-fprintf" {
            i += 3;
            continue;
        }

        if tok == "-delete" {
            return Some(Block {
                reason: REASON_DELETE.to_string(),
                segment: segment.to_string(),
            });
        }

        i += 1;
    }

    // Unterminated exec block: still inspect what we collected.
    if !exec_child.is_empty() {
        return check_exec_child(&exec_child, segment);
    }

    None
}

fn check_exec_child(child: &[String], segment: &str) -> Option<Block> {
    let stripped = wrappers::strip_wrappers(child);
    let head = stripped.tokens.first().map(|t| wrappers::normalize_head(t))?;
    if head == "rm" && super::rm::has_recursive_force(&stripped.tokens[1..]) {
        return Some(Block {
            reason: REASON_EXEC_RM.to_string(),
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
        analyze(&toks(args), "find ...")
    }

    #[test]
    fn test_delete_blocked() {
        let b = run(&[".", "-name", "*.pyc", "-delete"]).unwrap();
        assert!(b.reason.contains("find -delete"));
    }

    #[test]
    fn test_delete_as_name_argument_allowed() {
        assert!(run(&[".", "-name", "-delete", "-print"]).is_none());
    }

    #[test]
    fn test_delete_inside_exec_allowed() {
        assert!(run(&[".", "-exec", "echo", "-delete", ";", "-print"]).is_none());
        assert!(run(&[".", "-exec", "echo", "-delete", "+", "-print"]).is_none());
    }

    #[test]
    fn test_delete_after_exec_block_blocked() {
        assert!(run(&[".", "-exec", "echo", "x", ";", "-delete"]).is_some());
    }

    #[test]
    fn test_print_allowed() {
        assert!(run(&[".", "-name", "*.pyc", "-print"]).is_none());
    }

    #[test]
    fn test_exec_rm_rf_blocked() {
        let b = run(&[".", "-type", "d", "-exec", "rm", "-rf", "{}", ";"]).unwrap();
        assert!(b.reason.contains("-exec rm"));
        assert!(run(&[".", "-execdir", "rm", "-fr", "{}", "+"]).is_some());
    }

    #[test]
    fn test_exec_rm_without_force_allowed() {
        assert!(run(&[".", "-exec", "rm", "-r", "{}", ";"]).is_none());
        assert!(run(&[".", "-exec", "rm", "{}", ";"]).is_none());
    }

    #[test]
    fn test_exec_sudo_rm_rf_blocked() {
        assert!(run(&[".", "-exec", "sudo", "rm", "-rf", "{}", ";"]).is_some());
    }

    #[test]
    fn test_unterminated_exec_rm_rf_blocked() {
        assert!(run(&[".", "-exec", "rm", "-rf", "{}"]).is_some());
    }

    #[test]
    fn test_nested_exec_depth() {
        // The inner -exec token nests; -delete after both terminators is a
        // real action again.
        assert!(run(&[".", "-exec", "find", "x", "-exec", "echo", ";", ";", "-delete"]).is_some());
        assert!(run(&[".", "-exec", "find", "x", "-exec", "echo", "-delete", ";", ";"]).is_none());
    }
}
