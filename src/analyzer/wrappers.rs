//! Wrapper and disguise stripping.
//!
//! Peels neutral prefixes (`sudo`, `env VAR=val ...`, `command`, `builtin`,
//! `busybox`, leading-backslash alias bypass) off a token sequence so the
//! rule modules always see the real command head. Environment assignments
//! encountered along the way are collected; a later assignment for the same
//! name overwrites the earlier one, so `env` wrapper values win over leading
//! `VAR=val` prefixes.

use std::collections::HashMap;

/// Tokens with neutral wrappers removed, plus the accumulated `VAR=val`
/// assignments that prefixed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stripped {
    pub tokens: Vec<String>,
    pub env: HashMap<String, String>,
}

/// `sudo` short options that take no argument.
const SUDO_SIMPLE_FLAGS: &[char] = &['A', 'b', 'E', 'H', 'i', 'K', 'k', 'n', 'P', 'S', 's', 'v'];
/// `sudo` short options that consume the next token.
const SUDO_ARG_FLAGS: &[char] = &['C', 'D', 'g', 'h', 'p', 'R', 'r', 'T', 't', 'U', 'u'];
/// `sudo` long options that consume the next token when written without `=`.
const SUDO_ARG_LONG: &[&str] = &[
    "--chdir",
    "--chroot",
    "--close-from",
    "--group",
    "--host",
    "--prompt",
    "--role",
    "--type",
    "--user",
    "--other-user",
    "--command-timeout",
];

/// Normalize a head token for dispatch: strip any path prefix and lowercase.
pub fn normalize_head(token: &str) -> String {
    let base = token.rsplit('/').next().unwrap_or(token);
    base.to_lowercase()
}

fn is_env_assignment(token: &str) -> bool {
    let Some(eq) = token.find('=') else {
        return false;
    };
    let name = &token[..eq];
    !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
}

fn record_assignment(env: &mut HashMap<String, String>, token: &str) {
    if let Some((name, value)) = token.split_once('=') {
        env.insert(name.to_string(), value.to_string());
    }
}

/// Consume `sudo`'s own options starting at `i`, returning the index of the
/// wrapped command.
fn skip_sudo_options(tokens: &[String], mut i: usize) -> usize {
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok == "--" {
            return i + 1;
        }
        if !tok.starts_with('-') || tok == "-" {
            return i;
        }
        if let Some(long) = tok.strip_prefix("--") {
            let name = format!("--{}", long.split('=').next().unwrap_or(long));
            if SUDO_ARG_LONG.contains(&name.as_str()) && !tok.contains('=') {
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        // Short option cluster: an argument-taking flag consumes the rest of
        // the cluster (attached value) or the next token.
        let chars: Vec<char> = tok[1..].chars().collect();
        let mut consumed_next = false;
        for (pos, c) in chars.iter().enumerate() {
            if SUDO_ARG_FLAGS.contains(c) {
                if pos == chars.len() - 1 {
                    consumed_next = true;
                }
                break;
            }
            if !SUDO_SIMPLE_FLAGS.contains(c) {
                break;
            }
        }
        i += if consumed_next { 2 } else { 1 };
    }
    i
}

/// Consume `env`'s own options starting at `i`. The `VAR=val` pairs that
/// follow are handled by the caller's assignment pass.
fn skip_env_options(tokens: &[String], mut i: usize) -> usize {
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok == "--" {
            return i + 1;
        }
        match tok.as_str() {
            "-i" | "-0" | "--ignore-environment" | "--null" => i += 1,
            "-u" | "--unset" | "-C" | "--chdir" | "-S" | "--split-string" => i += 2,
            _ if tok.starts_with("--unset=") || tok.starts_with("--chdir=") => i += 1,
            _ => return i,
        }
    }
    i
}

/// Strip neutral wrappers and collect environment assignments.
///
/// Wrapper names are compared case-insensitively; argument case is
/// preserved. `command -v`/`command -V` is a query, not a wrapper, and is
/// left untouched.
pub fn strip_wrappers(tokens: &[String]) -> Stripped {
    let mut env = HashMap::new();
    let mut i = 0;

    loop {
        // Assignment prefixes (also covers `env`'s VAR=val arguments).
        while i < tokens.len() && is_env_assignment(&tokens[i]) {
            record_assignment(&mut env, &tokens[i]);
            i += 1;
        }
        if i >= tokens.len() {
            break;
        }

        let head = normalize_head(&tokens[i]);
        match head.as_str() {
            "sudo" => {
                i = skip_sudo_options(tokens, i + 1);
            }
            "env" => {
                i = skip_env_options(tokens, i + 1);
            }
            "command" => {
                let next = tokens.get(i + 1).map(String::as_str);
                if matches!(next, Some("-v") | Some("-V")) {
                    break;
                }
                i += 1;
                while matches!(tokens.get(i).map(String::as_str), Some("-p") | Some("--")) {
                    i += 1;
                }
            }
            "builtin" | "busybox" => {
                i += 1;
            }
            _ if tokens[i].starts_with('\\') && tokens[i].len() > 1 => {
                // Alias bypass: \rm → rm. Rewrite in place and re-examine.
                let mut rest: Vec<String> = tokens[i..].to_vec();
                rest[0] = rest[0][1..].to_string();
                let mut inner = strip_wrappers(&rest);
                // Inner assignments come later in token order, so they win.
                for (name, value) in inner.env.drain() {
                    env.insert(name, value);
                }
                return Stripped {
                    tokens: inner.tokens,
                    env,
                };
            }
            _ => break,
        }
    }

    Stripped {
        tokens: tokens[i.min(tokens.len())..].to_vec(),
        env,
    }
}
