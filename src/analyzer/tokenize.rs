//! Shell-aware segmentation and word tokenization.
//!
//! Splits a raw command line into operator-delimited segments (`&&`, `||`,
//! `;`, `|`, `|&`, newline) while respecting quoting, backslash escapes, and
//! nested `(...)`, `{...}`, `$(...)`, `<(...)`, and backtick constructs, so
//! operators inside those are never split points. Word tokenization is
//! POSIX-like via `shlex`; a segment that cannot be tokenized is reported as
//! unparseable rather than discarded.

/// One shell-operator-delimited slice of a command line.
///
/// `text` is the literal source substring (trimmed), kept for reporting and
/// for the raw-text scanners that need untokenized syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
}

/// Outcome of tokenizing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    /// Quote-aware word tokens.
    Words(Vec<String>),
    /// The segment could not be safely tokenized (unterminated quote, or the
    /// tokenizer returned the input unchanged despite embedded whitespace).
    Unparseable,
}

/// Split a command line into top-level segments.
///
/// Operators inside quotes, backticks, or any nesting construct are not
/// split points. Empty slices (e.g. from `;;` or a trailing operator) are
/// dropped.
pub fn split_segments(command: &str) -> Vec<Segment> {
    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();

    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    let mut in_single = false;
    let mut in_double = false;
    let mut in_backtick = false;
    let mut escaped = false;
    let mut paren_depth = 0usize;
    let mut brace_depth = 0usize;

    let push = |segments: &mut Vec<Segment>, start: usize, end: usize| {
        let text: String = chars[start..end].iter().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            segments.push(Segment {
                text: trimmed.to_string(),
            });
        }
    };

    while i < len {
        let c = chars[i];

        if escaped {
            escaped = false;
            i += 1;
            continue;
        }

        match c {
            '\\' if !in_single => {
                escaped = true;
                i += 1;
                continue;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                i += 1;
                continue;
            }
            '"' if !in_single => {
                in_double = !in_double;
                i += 1;
                continue;
            }
            _ => {}
        }

        if in_single || in_double {
            i += 1;
            continue;
        }

        match c {
            '`' => {
                in_backtick = !in_backtick;
                i += 1;
                continue;
            }
            '(' => {
                paren_depth += 1;
                i += 1;
                continue;
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                i += 1;
                continue;
            }
            '{' => {
                brace_depth += 1;
                i += 1;
                continue;
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                i += 1;
                continue;
            }
            _ => {}
        }

        if in_backtick || paren_depth > 0 || brace_depth > 0 {
            i += 1;
            continue;
        }

        // Two-char operators first: &&, ||, |&
        if i + 1 < len {
            let pair = (c, chars[i + 1]);
            if pair == ('&', '&') || pair == ('|', '|') || pair == ('|', '&') {
                push(&mut segments, start, i);
                i += 2;
                start = i;
                continue;
            }
        }

        if c == '|' || c == ';' || c == '\n' {
            push(&mut segments, start, i);
            i += 1;
            start = i;
            continue;
        }

        i += 1;
    }

    push(&mut segments, start, len);
    segments
}

/// Tokenize one segment into quote-aware words.
pub fn tokenize(segment: &str) -> Tokenized {
    match shlex::split(segment) {
        Some(words) => {
            // A tokenizer that hands back the whole input as one word, with
            // whitespace still inside it, did not actually parse anything.
            if words.len() == 1 && words[0] == segment && segment.contains(char::is_whitespace) {
                return Tokenized::Unparseable;
            }
            Tokenized::Words(words)
        }
        None => Tokenized::Unparseable,
    }
}
