//! Recursive force-delete rules.
//!
//! `rm` is only blocked when it is both recursive and forced AND the target
//! resolves somewhere a coding agent has no business deleting: outside the
//! working directory and outside the recognized temp dirs. Paranoid mode
//! drops the target test and blocks every recursive force-delete.

use std::collections::HashMap;

use super::Block;
use crate::analyzer::cwd::normalize_path;

/// Inputs the rm rule needs beyond the argument list.
pub struct RmContext<'a> {
    pub env: &'a HashMap<String, String>,
    /// Where this rm will actually run (after any cd in earlier segments).
    /// Relative targets resolve against it.
    pub cwd: Option<&'a str>,
    /// The session's original working directory: the boundary targets must
    /// stay inside.
    pub boundary: Option<&'a str>,
    pub home: Option<&'a str>,
    pub tmpdir: Option<&'a str>,
    pub paranoid: bool,
}

/// Parsed rm flags and targets.
struct RmArgs<'a> {
    recursive: bool,
    force: bool,
    targets: Vec<&'a str>,
}

fn parse_args(args: &[String]) -> RmArgs<'_> {
    let mut parsed = RmArgs {
        recursive: false,
        force: false,
        targets: Vec::new(),
    };
    let mut opts_done = false;
    for arg in args {
        if !opts_done && arg == "--" {
            opts_done = true;
            continue;
        }
        if !opts_done && arg.starts_with("--") {
            match arg.as_str() {
                "--recursive" => parsed.recursive = true,
                "--force" => parsed.force = true,
                _ => {}
            }
            continue;
        }
        if !opts_done && arg.starts_with('-') && arg.len() > 1 {
            parsed.recursive |= arg.contains(['r', 'R']);
            parsed.force |= arg.contains('f');
            continue;
        }
        parsed.targets.push(arg.as_str());
    }
    parsed
}

/// True when both recursive and force flags are present (any spelling).
pub fn has_recursive_force(args: &[String]) -> bool {
    let parsed = parse_args(args);
    parsed.recursive && parsed.force
}

fn path_is_under(base: &str, path: &str) -> bool {
    path == base || path.starts_with(&format!("{}/", base.trim_end_matches('/')))
}

fn is_recognized_temp(path: &str) -> bool {
    path_is_under("/tmp", path) || path_is_under("/var/tmp", path)
}

/// The TMPDIR that applies to this segment: a `TMPDIR=...` assignment on the
/// command line overrides the ambient value from the context.
fn effective_tmpdir<'a>(ctx: &'a RmContext<'a>) -> Option<&'a str> {
    ctx.env.get("TMPDIR").map(String::as_str).or(ctx.tmpdir)
}

/// Resolve one target to an absolute path, or None when it cannot be
/// resolved statically.
fn resolve_target(target: &str, ctx: &RmContext<'_>) -> Option<String> {
    // $TMPDIR is the one variable we resolve, because the temp exemption
    // depends on it.
    for prefix in ["$TMPDIR", "${TMPDIR}"] {
        if let Some(rest) = target.strip_prefix(prefix) {
            let tmpdir = effective_tmpdir(ctx)?;
            return Some(normalize_path(&format!("{tmpdir}{rest}")));
        }
    }
    if target.contains('$') || target.contains('`') {
        return None;
    }

    let expanded = if target == "~" {
        ctx.home?.to_string()
    } else if let Some(rest) = target.strip_prefix("~/") {
        format!("{}/{rest}", ctx.home?)
    } else {
        target.to_string()
    };

    if expanded.starts_with('/') {
        Some(normalize_path(&expanded))
    } else {
        let cwd = ctx.cwd?;
        Some(normalize_path(&format!("{cwd}/{expanded}")))
    }
}

pub fn analyze(args: &[String], ctx: &RmContext<'_>, segment: &str) -> Option<Block> {
    let parsed = parse_args(args);
    if !(parsed.recursive && parsed.force) {
        return None;
    }

    if ctx.paranoid {
        return Some(Block {
            reason: "rm with recursive and force flags is blocked in paranoid mode. \
                     Delete files individually or disable paranoid_rm."
                .to_string(),
            segment: segment.to_string(),
        });
    }

    // Running rm -rf while sitting in the home directory is dangerous no
    // matter what the target looks like.
    if let (Some(cwd), Some(home)) = (ctx.cwd, ctx.home)
        && normalize_path(cwd) == normalize_path(home)
    {
        return Some(Block {
            reason: "rm -rf while the working directory is your home directory \
                     risks deleting personal files. cd into a project first."
                .to_string(),
            segment: segment.to_string(),
        });
    }

    for target in &parsed.targets {
        // A target we cannot resolve statically is skipped rather than
        // guessed at; paranoid mode exists for tighter handling.
        let Some(resolved) = resolve_target(target, ctx) else {
            continue;
        };

        if is_recognized_temp(&resolved) {
            continue;
        }

        let inside_boundary = match ctx.boundary {
            Some(boundary) => path_is_under(&normalize_path(boundary), &resolved),
            // Without a known boundary, a resolved absolute path outside
            // the temp dirs has nothing vouching for it.
            None => false,
        };

        if !inside_boundary {
            return Some(Block {
                reason: format!(
                    "rm -rf targets '{target}' outside the working directory and \
                     outside the recognized temp dirs. Delete it manually if intended."
                ),
                segment: segment.to_string(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    fn ctx<'a>(env: &'a HashMap<String, String>) -> RmContext<'a> {
        RmContext {
            env,
            cwd: Some("/home/user/project"),
            boundary: Some("/home/user/project"),
            home: Some("/home/user"),
            tmpdir: None,
            paranoid: false,
        }
    }

    #[test]
    fn test_requires_both_flags() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-r", "/etc"]), &c, "rm").is_none());
        assert!(analyze(&toks(&["-f", "/etc"]), &c, "rm").is_none());
        assert!(analyze(&toks(&["/etc"]), &c, "rm").is_none());
    }

    #[test]
    fn test_combined_and_split_flags() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "/etc/nginx"]), &c, "rm").is_some());
        assert!(analyze(&toks(&["-fR", "/etc/nginx"]), &c, "rm").is_some());
        assert!(analyze(&toks(&["-r", "-f", "/etc/nginx"]), &c, "rm").is_some());
        assert!(analyze(&toks(&["--recursive", "--force", "/etc/nginx"]), &c, "rm").is_some());
    }

    #[test]
    fn test_temp_dirs_exempt() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "/tmp/build"]), &c, "rm").is_none());
        assert!(analyze(&toks(&["-rf", "/var/tmp/cache"]), &c, "rm").is_none());
    }

    #[test]
    fn test_tmp_prefix_lookalike_not_exempt() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "/tmpfoo"]), &c, "rm").is_some());
    }

    #[test]
    fn test_inside_cwd_allowed() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "build"]), &c, "rm").is_none());
        assert!(analyze(&toks(&["-rf", "./target/debug"]), &c, "rm").is_none());
        assert!(analyze(&toks(&["-rf", "/home/user/project/node_modules"]), &c, "rm").is_none());
    }

    #[test]
    fn test_outside_cwd_blocked() {
        let env = HashMap::new();
        let c = ctx(&env);
        let b = analyze(&toks(&["-rf", "../sibling-project"]), &c, "rm").unwrap();
        assert!(b.reason.contains("outside the working directory"));
        assert!(analyze(&toks(&["-rf", "/home/user/other"]), &c, "rm").is_some());
    }

    #[test]
    fn test_tilde_target_blocked() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "~/documents"]), &c, "rm").is_some());
    }

    #[test]
    fn test_tmpdir_reassigned_away_not_exempt() {
        let mut env = HashMap::new();
        env.insert("TMPDIR".to_string(), "/home/user/evil".to_string());
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "$TMPDIR/x"]), &c, "rm").is_some());
    }

    #[test]
    fn test_tmpdir_pointing_at_temp_exempt() {
        let mut env = HashMap::new();
        env.insert("TMPDIR".to_string(), "/tmp/session".to_string());
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "$TMPDIR/x"]), &c, "rm").is_none());
    }

    #[test]
    fn test_ambient_tmpdir_from_context() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        c.tmpdir = Some("/var/tmp/agent");
        assert!(analyze(&toks(&["-rf", "$TMPDIR/scratch"]), &c, "rm").is_none());
    }

    #[test]
    fn test_unresolvable_variable_target_skipped() {
        let env = HashMap::new();
        let c = ctx(&env);
        assert!(analyze(&toks(&["-rf", "$BUILD_DIR"]), &c, "rm").is_none());
    }

    #[test]
    fn test_cwd_is_home_blocks_everything() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        c.cwd = Some("/home/user");
        let b = analyze(&toks(&["-rf", "scratch"]), &c, "rm").unwrap();
        assert!(b.reason.contains("home directory"));
    }

    #[test]
    fn test_unknown_cwd_relative_target_skipped() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        c.cwd = None;
        c.boundary = None;
        assert!(analyze(&toks(&["-rf", "build"]), &c, "rm").is_none());
    }

    #[test]
    fn test_unknown_cwd_absolute_target_blocked() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        c.cwd = None;
        c.boundary = None;
        assert!(analyze(&toks(&["-rf", "/opt/data"]), &c, "rm").is_some());
    }

    #[test]
    fn test_cd_elsewhere_still_bounded_by_session_cwd() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        // The command cd'd to /opt/data; the session boundary is still the
        // project directory.
        c.cwd = Some("/opt/data");
        assert!(analyze(&toks(&["-rf", "cache"]), &c, "rm").is_some());
        assert!(analyze(&toks(&["-rf", "/home/user/project/build"]), &c, "rm").is_none());
    }

    #[test]
    fn test_paranoid_blocks_all() {
        let env = HashMap::new();
        let mut c = ctx(&env);
        c.paranoid = true;
        let b = analyze(&toks(&["-rf", "build"]), &c, "rm").unwrap();
        assert!(b.reason.contains("paranoid"));
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let env = HashMap::new();
        let c = ctx(&env);
        // After --, "-rf" is a filename, not flags.
        assert!(analyze(&toks(&["--", "-rf"]), &c, "rm").is_none());
    }
}
