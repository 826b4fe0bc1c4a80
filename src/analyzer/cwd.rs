//! Working-directory tracking across segments.
//!
//! Follows `cd`, `pushd`, and `popd` through a command line so that
//! cwd-dependent rules (notably the `rm` target check) know where later
//! segments will run. The moment a directory change has a non-literal or
//! unresolvable target, the tracker goes permanently indeterminate for the
//! rest of the command line; rules must then skip rather than guess.

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() && !absolute {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// True if `path` contains shell syntax we refuse to resolve statically.
fn is_literal_path(path: &str) -> bool {
    !path.contains('$') && !path.contains('`') && !path.contains('*') && !path.contains('?')
}

#[derive(Debug, Clone)]
pub struct CwdTracker {
    cwd: Option<String>,
    home: Option<String>,
    stack: Vec<String>,
    indeterminate: bool,
}

impl CwdTracker {
    pub fn new(cwd: Option<String>, home: Option<String>) -> Self {
        Self {
            cwd,
            home,
            stack: Vec::new(),
            indeterminate: false,
        }
    }

    /// The directory later segments will run in, if still known.
    pub fn current(&self) -> Option<&str> {
        if self.indeterminate {
            None
        } else {
            self.cwd.as_deref()
        }
    }

    /// Feed one segment's tokens through the tracker. Only `cd`, `pushd`,
    /// and `popd` heads have any effect.
    pub fn apply(&mut self, tokens: &[String]) {
        if self.indeterminate || tokens.is_empty() {
            return;
        }
        let head = super::wrappers::normalize_head(&tokens[0]);
        let args: Vec<&String> = tokens[1..].iter().filter(|t| *t != "--").collect();

        match head.as_str() {
            "cd" => match args.first() {
                None => self.cwd = self.home.clone(),
                Some(target) => self.change_to(target),
            },
            "pushd" => match args.first() {
                // Bare pushd swaps the top two entries; with nothing pushed
                // yet there is nothing to swap.
                None => {
                    if let (Some(cwd), Some(top)) = (self.cwd.clone(), self.stack.pop()) {
                        self.stack.push(cwd);
                        self.cwd = Some(top);
                    } else {
                        self.invalidate();
                    }
                }
                Some(target) => {
                    let previous = self.cwd.clone();
                    self.change_to(target);
                    if !self.indeterminate
                        && let Some(prev) = previous
                    {
                        self.stack.push(prev);
                    }
                }
            },
            "popd" => match self.stack.pop() {
                Some(dir) => self.cwd = Some(dir),
                None => self.invalidate(),
            },
            _ => {}
        }
    }

    fn change_to(&mut self, target: &str) {
        if target == "-" || !is_literal_path(target) {
            self.invalidate();
            return;
        }

        let expanded = if target == "~" {
            match &self.home {
                Some(home) => home.clone(),
                None => return self.invalidate(),
            }
        } else if let Some(rest) = target.strip_prefix("~/") {
            match &self.home {
                Some(home) => format!("{home}/{rest}"),
                None => return self.invalidate(),
            }
        } else {
            target.to_string()
        };

        if expanded.starts_with('/') {
            self.cwd = Some(normalize_path(&expanded));
        } else {
            match self.cwd.take() {
                Some(cwd) => self.cwd = Some(normalize_path(&format!("{cwd}/{expanded}"))),
                None => self.invalidate(),
            }
        }
    }

    fn invalidate(&mut self) {
        self.indeterminate = true;
        self.cwd = None;
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    fn tracker() -> CwdTracker {
        CwdTracker::new(
            Some("/home/user/project".to_string()),
            Some("/home/user".to_string()),
        )
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/../c"), "/a/c");
        assert_eq!(normalize_path("/a/./b/"), "/a/b");
        assert_eq!(normalize_path("a/../../b"), "../b");
        assert_eq!(normalize_path("/.."), "/");
    }

    #[test]
    fn test_cd_absolute_and_relative() {
        let mut t = tracker();
        t.apply(&toks(&["cd", "/tmp/build"]));
        assert_eq!(t.current(), Some("/tmp/build"));
        t.apply(&toks(&["cd", "sub"]));
        assert_eq!(t.current(), Some("/tmp/build/sub"));
        t.apply(&toks(&["cd", ".."]));
        assert_eq!(t.current(), Some("/tmp/build"));
    }

    #[test]
    fn test_cd_bare_goes_home() {
        let mut t = tracker();
        t.apply(&toks(&["cd"]));
        assert_eq!(t.current(), Some("/home/user"));
    }

    #[test]
    fn test_cd_tilde() {
        let mut t = tracker();
        t.apply(&toks(&["cd", "~/work"]));
        assert_eq!(t.current(), Some("/home/user/work"));
    }

    #[test]
    fn test_cd_variable_invalidates_permanently() {
        let mut t = tracker();
        t.apply(&toks(&["cd", "$BUILD_DIR"]));
        assert_eq!(t.current(), None);
        // Even a later literal cd cannot restore certainty.
        t.apply(&toks(&["cd", "/tmp"]));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn test_cd_dash_invalidates() {
        let mut t = tracker();
        t.apply(&toks(&["cd", "-"]));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn test_pushd_popd_round_trip() {
        let mut t = tracker();
        t.apply(&toks(&["pushd", "/tmp"]));
        assert_eq!(t.current(), Some("/tmp"));
        t.apply(&toks(&["popd"]));
        assert_eq!(t.current(), Some("/home/user/project"));
    }

    #[test]
    fn test_popd_on_empty_stack_invalidates() {
        let mut t = tracker();
        t.apply(&toks(&["popd"]));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn test_unrelated_commands_ignored() {
        let mut t = tracker();
        t.apply(&toks(&["ls", "-la"]));
        t.apply(&toks(&["git", "status"]));
        assert_eq!(t.current(), Some("/home/user/project"));
    }

    #[test]
    fn test_unknown_cwd_relative_cd_invalidates() {
        let mut t = CwdTracker::new(None, None);
        t.apply(&toks(&["cd", "sub"]));
        assert_eq!(t.current(), None);
    }
}
