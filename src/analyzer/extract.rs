//! Embedded command extraction for shell launchers and interpreters.
//!
//! `bash -c '...'` and `python -c '...'` carry whole command lines inside a
//! single token. This module finds those payloads so the analyzer can
//! re-enter them at depth+1.

/// Shells whose `-c` argument is a command line.
const SHELL_LAUNCHERS: &[&str] = &["bash", "sh", "zsh", "ksh", "dash", "fish"];

/// Interpreters whose `-c`/`-e` argument is code that routinely shells out.
const INTERPRETERS: &[&str] = &[
    "node", "nodejs", "perl", "python", "python2", "python3", "ruby",
];

pub fn is_shell_launcher(head: &str) -> bool {
    SHELL_LAUNCHERS.contains(&head)
}

pub fn is_interpreter(head: &str) -> bool {
    INTERPRETERS.contains(&head)
}

/// True for a short-option cluster (`-lc`, `-xec`) containing `flag`.
fn cluster_contains(token: &str, flag: char) -> bool {
    token.strip_prefix('-').is_some_and(|rest| {
        !rest.starts_with('-')
            && !rest.is_empty()
            && rest.chars().all(|c| c.is_ascii_alphabetic())
            && rest.contains(flag)
    })
}

fn payload_after<'a>(args: &'a [String], flags: &[char]) -> Option<&'a str> {
    for (i, token) in args.iter().enumerate() {
        if flags.iter().any(|f| cluster_contains(token, *f)) {
            return args.get(i + 1).map(String::as_str);
        }
    }
    None
}

/// The command string a shell launcher would run (`bash -c CMD`,
/// `sh -lc CMD`).
pub fn embedded_shell_command(args: &[String]) -> Option<&str> {
    payload_after(args, &['c'])
}

/// The code string an interpreter one-liner would run (`python -c CODE`,
/// `node -e CODE`).
pub fn embedded_interpreter_code(args: &[String]) -> Option<&str> {
    payload_after(args, &['c', 'e'])
}
