//! Command analysis engine.
//!
//! `analyze` takes one raw command line plus an [`AnalysisContext`] and
//! returns a [`Verdict`]. The pipeline: segment the line on shell
//! operators, strip neutral wrappers off each segment, re-enter embedded
//! command lines from shell launchers and interpreter one-liners (bounded
//! by a recursion ceiling), and dispatch every remaining head to its rule
//! module. The first block short-circuits the whole command.
//!
//! The engine is synchronous, does no I/O, and never mutates its context,
//! so one loaded context can serve any number of concurrent callers.

pub mod custom;
pub mod cwd;
pub mod extract;
pub mod rules;
pub mod tokenize;
pub mod wrappers;

use tracing::{debug, info};

pub use custom::{CompiledRule, CustomRule, Matcher};

/// Branches nested deeper than this many launcher/interpreter layers yield
/// no verdict (fail-open for the branch, not the whole command).
pub const MAX_RECURSION_DEPTH: usize = 5;

/// Everything an analysis call may read. Constructed once at the process
/// boundary; the engine itself reads no ambient environment.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    /// Working directory the command will start in, when known.
    pub cwd: Option<String>,
    /// The user's home directory.
    pub home: Option<String>,
    /// Ambient TMPDIR, made explicit for testability.
    pub tmpdir: Option<String>,
    /// Fail closed on unparseable input.
    pub strict: bool,
    /// Block every recursive force-delete regardless of target.
    pub paranoid_rm: bool,
    /// Block interpreter one-liners outright instead of analyzing them.
    pub paranoid_interpreters: bool,
    /// Compiled user rules, applied at depth 0 only.
    pub custom_rules: Vec<CompiledRule>,
}

/// The outcome of one analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Blocked {
        reason: String,
        /// The smallest offending sub-segment available.
        segment: String,
    },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Internal block result; `analyze` lifts it into a [`Verdict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub reason: String,
    pub segment: String,
}

const REASON_STRICT_UNPARSEABLE: &str =
    "Command could not be safely analyzed and strict mode fails closed. \
     Unset SHELLGUARD_STRICT (or strict in the config) to fail open.";
const REASON_PARANOID_INTERPRETER: &str =
    "Inline interpreter code is blocked in paranoid-interpreters mode. \
     Write the code to a reviewed script file instead.";

/// Analyze one command line. Deterministic and side-effect-free for fixed
/// inputs.
pub fn analyze(command: &str, ctx: &AnalysisContext) -> Verdict {
    match analyze_line(command, ctx, 0, ctx.cwd.clone()) {
        Some(block) => {
            info!(
                reason = %block.reason,
                segment = %block.segment,
                "blocked command"
            );
            Verdict::Blocked {
                reason: block.reason,
                segment: block.segment,
            }
        }
        None => Verdict::Allowed,
    }
}

/// Depth-parameterized recursive driver over one command line.
fn analyze_line(
    command: &str,
    ctx: &AnalysisContext,
    depth: usize,
    cwd: Option<String>,
) -> Option<Block> {
    if depth > MAX_RECURSION_DEPTH {
        debug!(depth, "recursion ceiling reached; branch yields no verdict");
        return None;
    }

    // Pipelines are judged on raw text: segmentation discards the pipe
    // structure this rule needs.
    if let Some(block) = rules::raw::scan_pipe_to_shell(command) {
        return Some(block);
    }

    let mut tracker = cwd::CwdTracker::new(cwd, ctx.home.clone());

    for segment in tokenize::split_segments(command) {
        if let Some(block) = analyze_segment(&segment, ctx, depth, &mut tracker) {
            return Some(block);
        }
    }
    None
}

fn analyze_segment(
    segment: &tokenize::Segment,
    ctx: &AnalysisContext,
    depth: usize,
    tracker: &mut cwd::CwdTracker,
) -> Option<Block> {
    // Raw-text check first: tokenizing destroys `<(...)`.
    if let Some(block) = rules::eval_source::scan_raw_source(&segment.text) {
        return Some(block);
    }

    let words = match tokenize::tokenize(&segment.text) {
        tokenize::Tokenized::Words(words) => words,
        tokenize::Tokenized::Unparseable => {
            if ctx.strict {
                return Some(Block {
                    reason: REASON_STRICT_UNPARSEABLE.to_string(),
                    segment: segment.text.clone(),
                });
            }
            debug!(segment = %segment.text, "unparseable segment, raw scan only");
            return rules::raw::scan_dangerous_phrases(&segment.text);
        }
    };
    if words.is_empty() {
        return None;
    }

    let stripped = wrappers::strip_wrappers(&words);
    if stripped.tokens.is_empty() {
        return None;
    }

    let head = wrappers::normalize_head(&stripped.tokens[0]);
    let args = &stripped.tokens[1..];

    if matches!(
        rules::CommandFamily::classify(&head),
        rules::CommandFamily::DirChange
    ) {
        tracker.apply(&stripped.tokens);
    }

    let current_cwd = tracker.current().map(str::to_string);
    let built_in = builtin_verdict(&head, args, &stripped, segment, ctx, depth, &current_cwd);
    if built_in.is_some() {
        return built_in;
    }

    if depth == 0
        && let Some(reason) = custom::evaluate(&ctx.custom_rules, &head, args)
    {
        return Some(Block {
            reason: reason.to_string(),
            segment: segment.text.clone(),
        });
    }

    None
}

#[allow(clippy::too_many_arguments)]
fn builtin_verdict(
    head: &str,
    args: &[String],
    stripped: &wrappers::Stripped,
    segment: &tokenize::Segment,
    ctx: &AnalysisContext,
    depth: usize,
    current_cwd: &Option<String>,
) -> Option<Block> {
    // Shell launchers: the -c payload is a whole command line.
    if extract::is_shell_launcher(head) {
        if let Some(code) = extract::embedded_shell_command(args) {
            return analyze_line(code, ctx, depth + 1, current_cwd.clone());
        }
    } else if extract::is_interpreter(head) {
        if let Some(code) = extract::embedded_interpreter_code(args) {
            if ctx.paranoid_interpreters {
                return Some(Block {
                    reason: REASON_PARANOID_INTERPRETER.to_string(),
                    segment: segment.text.clone(),
                });
            }
            if let Some(block) = analyze_line(code, ctx, depth + 1, current_cwd.clone()) {
                return Some(block);
            }
            // Structured analysis saw nothing: the code may still shell out.
            return rules::raw::scan_dangerous_phrases(code);
        }
    }

    let recurse = |command: &str| analyze_line(command, ctx, depth + 1, current_cwd.clone());
    let input = rules::SegmentInput {
        head,
        args,
        env: &stripped.env,
        cwd: current_cwd.as_deref(),
        segment: &segment.text,
        ctx,
    };
    rules::dispatch(&input, &recurse)
}
