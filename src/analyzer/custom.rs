//! User-declared custom rules.
//!
//! Custom rules supplement the built-in modules: they run at depth 0 only,
//! after the matching built-in (if any) has passed, and they are the only
//! coverage for heads no built-in module claims. Rules are validated and
//! compiled once at load time; a malformed rule is a reported error, never a
//! silently dropped one.

use regex::Regex;
use serde::Deserialize;

/// One argument matcher inside a custom rule.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    /// Any argument equals `value` exactly.
    Token { value: String },
    /// Any argument matches `pattern`.
    Regex { pattern: String },
    /// The flag is present: exact match, or for a single-letter short flag,
    /// membership in a combined cluster (`-f` matches `-rf`).
    Flag { name: String },
    /// The argument at `index` (0-based, flags included) equals `value`.
    Positional { index: usize, value: String },
}

/// A custom rule as declared in configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomRule {
    /// Command head this rule applies to (compared case-insensitively).
    pub command: String,
    /// Reason reported when the rule matches.
    pub reason: String,
    /// `true`: any matcher suffices. `false` (default): all must match.
    #[serde(default)]
    pub match_any: bool,
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Clone)]
enum CompiledMatcher {
    Token(String),
    Regex(Regex),
    Flag(String),
    Positional(usize, String),
}

/// A validated rule ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    command: String,
    reason: String,
    match_any: bool,
    matchers: Vec<CompiledMatcher>,
}

/// Validate and compile a rule set. Every invalid rule contributes one
/// message to the error list; nothing is dropped silently.
pub fn compile(rules: &[CustomRule]) -> Result<Vec<CompiledRule>, Vec<String>> {
    let mut compiled = Vec::new();
    let mut errors = Vec::new();

    for (idx, rule) in rules.iter().enumerate() {
        let label = if rule.command.is_empty() {
            format!("rule {}", idx + 1)
        } else {
            format!("rule {} ({})", idx + 1, rule.command)
        };

        if rule.command.trim().is_empty() {
            errors.push(format!("{label}: 'command' must not be empty"));
            continue;
        }
        if rule.reason.trim().is_empty() {
            errors.push(format!("{label}: 'reason' must not be empty"));
            continue;
        }
        if rule.matchers.is_empty() {
            errors.push(format!("{label}: at least one matcher is required"));
            continue;
        }

        let mut matchers = Vec::new();
        let mut rule_ok = true;
        for matcher in &rule.matchers {
            match matcher {
                Matcher::Token { value } => matchers.push(CompiledMatcher::Token(value.clone())),
                Matcher::Regex { pattern } => match Regex::new(pattern) {
                    Ok(re) => matchers.push(CompiledMatcher::Regex(re)),
                    Err(e) => {
                        errors.push(format!("{label}: invalid regex '{pattern}': {e}"));
                        rule_ok = false;
                    }
                },
                Matcher::Flag { name } => {
                    if !name.starts_with('-') {
                        errors.push(format!(
                            "{label}: flag '{name}' must start with '-'"
                        ));
                        rule_ok = false;
                    } else {
                        matchers.push(CompiledMatcher::Flag(name.clone()));
                    }
                }
                Matcher::Positional { index, value } => {
                    matchers.push(CompiledMatcher::Positional(*index, value.clone()));
                }
            }
        }

        if rule_ok {
            compiled.push(CompiledRule {
                command: rule.command.to_lowercase(),
                reason: rule.reason.clone(),
                match_any: rule.match_any,
                matchers,
            });
        }
    }

    if errors.is_empty() {
        Ok(compiled)
    } else {
        Err(errors)
    }
}

fn matcher_hits(matcher: &CompiledMatcher, args: &[String]) -> bool {
    match matcher {
        CompiledMatcher::Token(value) => args.iter().any(|a| a == value),
        CompiledMatcher::Regex(re) => args.iter().any(|a| re.is_match(a)),
        CompiledMatcher::Flag(name) => {
            if args.iter().any(|a| a == name) {
                return true;
            }
            // Short single-letter flags also hit inside clusters.
            match name.strip_prefix('-') {
                Some(short) if short.len() == 1 && !short.starts_with('-') => {
                    let c = short.chars().next().unwrap();
                    args.iter().any(|a| {
                        a.starts_with('-') && !a.starts_with("--") && a[1..].contains(c)
                    })
                }
                _ => false,
            }
        }
        CompiledMatcher::Positional(index, value) => {
            args.get(*index).is_some_and(|a| a == value)
        }
    }
}

/// Evaluate compiled rules against a normalized head and its arguments.
/// The first matching rule wins.
pub fn evaluate<'a>(rules: &'a [CompiledRule], head: &str, args: &[String]) -> Option<&'a str> {
    for rule in rules {
        if rule.command != head {
            continue;
        }
        let mut hits = rule.matchers.iter().map(|m| matcher_hits(m, args));
        let matched = if rule.match_any {
            hits.any(|h| h)
        } else {
            hits.all(|h| h)
        };
        if matched {
            return Some(&rule.reason);
        }
    }
    None
}
