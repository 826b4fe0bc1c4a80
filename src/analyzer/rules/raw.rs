//! Raw-text scanners.
//!
//! These operate on untokenized text because the syntax they look for does
//! not survive tokenization (pipelines span segment boundaries, process
//! substitution is eaten by the word splitter). They are a deliberate second
//! defense layer for input the structured path cannot see: unparseable
//! segments and interpreter one-liner code.

use regex::Regex;
use std::sync::LazyLock;

use super::Block;
use crate::analyzer::wrappers;

/// `| bash`-style pipelines: a pipe, optionally `sudo` and/or `env VAR=val`
/// prefixes, then a bare shell name at the end of the segment or directly
/// before the next operator. Text-based so multi-stage pipelines
/// (`curl ... | tee f | bash`) are caught no matter how they segment.
static PIPE_TO_SHELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\|&?\s*(?:sudo\s+)?(?:env\s+(?:[A-Za-z_][A-Za-z0-9_]*=\S*\s+)*)?(?:bash|sh|zsh|ksh|dash|fish)\s*(?:$|[;|&])",
    )
    .unwrap()
});

struct Phrase {
    regex: &'static LazyLock<Regex>,
    reason: &'static str,
}

macro_rules! lazy_re {
    ($pat:expr) => {{
        static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new($pat).unwrap());
        &RE
    }};
}

/// Dangerous phrases matched against raw text. Only consulted for input the
/// structured analysis could not parse (or interpreter code it found
/// nothing in), so precision is traded for recall.
static PHRASES: &[Phrase] = &[
    Phrase {
        regex: lazy_re!(r"(?i)\bgit\s+reset\s+--hard\b"),
        reason: "git reset --hard destroys uncommitted changes. Use 'git stash' first.",
    },
    Phrase {
        regex: lazy_re!(r"(?i)\bgit\s+push\b[^|;&]*(\s--force(\s|$)|\s-f\b)"),
        reason: "Force push can destroy remote history. Use --force-with-lease if necessary.",
    },
    Phrase {
        regex: lazy_re!(r"(?i)\bgit\s+checkout\b[^|;&]*\s--(\s|$)"),
        reason: "git checkout -- discards uncommitted changes permanently.",
    },
    Phrase {
        regex: lazy_re!(r"(?i)\bgit\s+clean\s+-[a-z]*f"),
        reason: "git clean -f removes untracked files permanently.",
    },
    Phrase {
        regex: lazy_re!(r"(?i)\bfind\s+[^|;&]*-delete\b"),
        reason: "find -delete permanently removes files. Review matches with -print first.",
    },
];

/// Scan for pipe-to-shell pipelines over the whole raw command text.
pub fn scan_pipe_to_shell(text: &str) -> Option<Block> {
    PIPE_TO_SHELL.find(text).map(|m| Block {
        reason: "Piping downloaded or generated content into a shell executes it unseen. \
                 Save to a file and review it first."
            .to_string(),
        segment: m.as_str().trim().to_string(),
    })
}

/// True when `words` contains an `rm` invocation with both recursive and
/// force flags (combined short forms included).
fn is_rm_rf(words: &[&str]) -> bool {
    let Some(pos) = words
        .iter()
        .position(|w| wrappers::normalize_head(w) == "rm")
    else {
        return false;
    };
    let mut recursive = false;
    let mut force = false;
    for w in &words[pos + 1..] {
        match *w {
            "--recursive" => recursive = true,
            "--force" => force = true,
            _ if w.starts_with('-') && !w.starts_with("--") => {
                recursive |= w.contains(['r', 'R']);
                force |= w.contains('f');
            }
            _ => {}
        }
    }
    recursive && force
}

/// Scan raw text for dangerous phrases. Used for unparseable segments and
/// as a fallback over interpreter code.
pub fn scan_dangerous_phrases(text: &str) -> Option<Block> {
    for phrase in PHRASES {
        if let Some(m) = phrase.regex.find(text) {
            return Some(Block {
                reason: phrase.reason.to_string(),
                segment: m.as_str().trim().to_string(),
            });
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if is_rm_rf(&words) {
        return Some(Block {
            reason: "Embedded rm -rf (recursive force delete) detected.".to_string(),
            segment: text.trim().to_string(),
        });
    }

    scan_pipe_to_shell(text)
}
