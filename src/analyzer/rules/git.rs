//! Git command rules.
//!
//! Dispatches on the git subcommand after skipping git's global options, and
//! blocks the operations that discard uncommitted work or rewrite shared
//! history.

use super::Block;
use super::short_opts;

const REASON_CHECKOUT_DOUBLE_DASH: &str =
    "git checkout -- discards uncommitted changes permanently. Use 'git stash' first.";
const REASON_CHECKOUT_REF_DOUBLE_DASH: &str =
    "git checkout <ref> -- <path> overwrites the working tree. Use 'git stash' first.";
const REASON_RESTORE: &str =
    "git restore discards uncommitted changes. Use 'git stash' or 'git diff' first.";
const REASON_RESTORE_WORKTREE: &str =
    "git restore --worktree discards uncommitted changes permanently.";
const REASON_RESET_HARD: &str =
    "git reset --hard destroys uncommitted changes. Use 'git stash' first.";
const REASON_RESET_MERGE: &str = "git reset --merge can lose uncommitted changes.";
const REASON_CLEAN_FORCE: &str =
    "git clean -f removes untracked files permanently. Review with 'git clean -n' first.";
const REASON_PUSH_FORCE: &str =
    "Force push can destroy remote history. Use --force-with-lease if necessary.";
const REASON_BRANCH_DELETE_FORCE: &str =
    "git branch -D force-deletes without a merge check. Use -d for safety.";
const REASON_STASH_DROP: &str =
    "git stash drop permanently deletes stashed changes. List stashes first with 'git stash list'.";
const REASON_STASH_CLEAR: &str = "git stash clear permanently deletes ALL stashed changes.";

/// Global git options that consume a separate value token.
const OPTS_WITH_VALUE: &[&str] = &[
    "-c",
    "-C",
    "--exec-path",
    "--git-dir",
    "--namespace",
    "--super-prefix",
    "--work-tree",
];

/// Global git options that stand alone.
const OPTS_NO_VALUE: &[&str] = &[
    "-p",
    "-P",
    "-h",
    "--help",
    "--no-pager",
    "--paginate",
    "--version",
    "--bare",
    "--no-replace-objects",
    "--literal-pathspecs",
    "--noglob-pathspecs",
    "--icase-pathspecs",
];

/// Skip git's global options and return the subcommand plus everything
/// after it.
fn subcommand_and_rest(args: &[String]) -> Option<(String, &[String])> {
    let mut i = 0;
    while i < args.len() {
        let tok = args[i].as_str();
        if tok == "--" {
            i += 1;
            break;
        }
        if !tok.starts_with('-') || tok == "-" {
            break;
        }
        if OPTS_NO_VALUE.contains(&tok) {
            i += 1;
            continue;
        }
        if OPTS_WITH_VALUE.contains(&tok) {
            i += 2;
            continue;
        }
        // Unknown long options (--opt=value carries its value inline) and
        // short options with attached values (-Crepo, -cname=value).
        i += 1;
    }

    if i >= args.len() {
        return None;
    }
    Some((args[i].clone(), &args[i + 1..]))
}

pub fn analyze(args: &[String], segment: &str) -> Option<Block> {
    let (sub, rest) = subcommand_and_rest(args)?;
    let sub = sub.to_lowercase();
    let rest_lower: Vec<String> = rest.iter().map(|t| t.to_lowercase()).collect();
    let short = short_opts(rest);

    let reason = match sub.as_str() {
        "checkout" => match rest.iter().position(|t| t == "--") {
            Some(0) => Some(REASON_CHECKOUT_DOUBLE_DASH),
            Some(_) => Some(REASON_CHECKOUT_REF_DOUBLE_DASH),
            None => None,
        },
        "restore" => {
            if rest_lower.iter().any(|t| t == "-h" || t == "--help" || t == "--version") {
                None
            } else if rest_lower.iter().any(|t| t == "--worktree") {
                Some(REASON_RESTORE_WORKTREE)
            } else if rest_lower.iter().any(|t| t == "--staged") {
                None
            } else {
                Some(REASON_RESTORE)
            }
        }
        "reset" => {
            if rest_lower.iter().any(|t| t == "--hard") {
                Some(REASON_RESET_HARD)
            } else if rest_lower.iter().any(|t| t == "--merge") {
                Some(REASON_RESET_MERGE)
            } else {
                None
            }
        }
        "clean" => {
            if rest_lower.iter().any(|t| t == "--force") || short.contains(&'f') {
                Some(REASON_CLEAN_FORCE)
            } else {
                None
            }
        }
        "push" => {
            let has_lease = rest_lower.iter().any(|t| t.starts_with("--force-with-lease"));
            let has_force = rest_lower.iter().any(|t| t == "--force") || short.contains(&'f');
            if has_force && !has_lease {
                Some(REASON_PUSH_FORCE)
            } else {
                None
            }
        }
        "branch" => {
            // Case matters: -D force-deletes, -d is the safe form.
            if rest.iter().any(|t| t == "-D") || short.contains(&'D') {
                Some(REASON_BRANCH_DELETE_FORCE)
            } else {
                None
            }
        }
        "stash" => match rest_lower.first().map(String::as_str) {
            Some("drop") => Some(REASON_STASH_DROP),
            Some("clear") => Some(REASON_STASH_CLEAR),
            _ => None,
        },
        _ => None,
    };

    reason.map(|r| Block {
        reason: r.to_string(),
        segment: segment.to_string(),
    })
}
