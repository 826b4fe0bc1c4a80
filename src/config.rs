//! Configuration loading and validation.
//!
//! Settings live in `~/.shellguard/config.toml` (or a `--config` path):
//! mode flags, an `enabled` kill-switch, and `[[rules]]` tables for custom
//! rules. A missing file means defaults; a broken file is an error the
//! caller must surface, because a silently ignored config would silently
//! drop protection.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::{AnalysisContext, CustomRule, custom};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    #[error("invalid custom rules:\n  {}", .0.join("\n  "))]
    InvalidRules(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kill-switch: when false, every command is allowed.
    pub enabled: bool,
    /// Fail closed on unparseable input.
    pub strict: bool,
    /// Block every recursive force-delete regardless of target.
    pub paranoid_rm: bool,
    /// Block interpreter one-liners outright.
    pub paranoid_interpreters: bool,
    /// User-declared custom rules.
    pub rules: Vec<CustomRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            strict: false,
            paranoid_rm: false,
            paranoid_interpreters: false,
            rules: Vec::new(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        home::home_dir().map(|mut p| {
            p.push(".shellguard");
            p.push("config.toml");
            p
        })
    }

    /// Load from `path`, or from the default location when `path` is None.
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path,
            source: Box::new(source),
        })
    }

    /// Compile custom rules, reporting every invalid one.
    pub fn compiled_rules(&self) -> Result<Vec<custom::CompiledRule>, ConfigError> {
        custom::compile(&self.rules).map_err(ConfigError::InvalidRules)
    }

    /// Build the analysis context. This is the process boundary: the one
    /// place ambient environment (home, TMPDIR, SHELLGUARD_STRICT) is read
    /// before being passed down as explicit values.
    pub fn build_context(&self, cwd: Option<String>) -> Result<AnalysisContext, ConfigError> {
        let custom_rules = self.compiled_rules()?;
        let strict_env = std::env::var("SHELLGUARD_STRICT")
            .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(AnalysisContext {
            cwd,
            home: home::home_dir().map(|p| p.display().to_string()),
            tmpdir: std::env::var("TMPDIR").ok().filter(|v| !v.is_empty()),
            strict: self.strict || strict_env,
            paranoid_rm: self.paranoid_rm,
            paranoid_interpreters: self.paranoid_interpreters,
            custom_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.enabled);
        assert!(!config.strict);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            strict = true
            paranoid_rm = true

            [[rules]]
            command = "terraform"
            reason = "terraform destroy is restricted"

            [[rules.matchers]]
            kind = "positional"
            index = 0
            value = "destroy"
            "#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.strict);
        assert!(config.paranoid_rm);
        assert!(!config.paranoid_interpreters);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].command, "terraform");
        assert_eq!(config.compiled_rules().unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let file = write_config("strict = [not toml");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_rules_reported_not_dropped() {
        let file = write_config(
            r#"
            [[rules]]
            command = ""
            reason = "x"

            [[rules.matchers]]
            kind = "token"
            value = "y"

            [[rules]]
            command = "git"
            reason = "bad regex"

            [[rules.matchers]]
            kind = "regex"
            pattern = "["
            "#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        let err = config.compiled_rules().unwrap_err();
        match err {
            ConfigError::InvalidRules(errors) => {
                assert_eq!(errors.len(), 2);
                let rendered = errors.join("\n");
                assert!(rendered.contains("command"));
                assert!(rendered.contains("regex"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_matcher_kind_is_a_parse_error() {
        let file = write_config(
            r#"
            [[rules]]
            command = "git"
            reason = "x"

            [[rules.matchers]]
            kind = "glob"
            value = "y"
            "#,
        );
        assert!(Config::load(Some(file.path())).is_err());
    }
}
