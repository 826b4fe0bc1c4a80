//! Gemini CLI shell-tool adapter.
//!
//! Request (stdin): `{"toolCall": {"name": "run_shell_command",
//! "args": {"command": "..."}}}`.
//! Response (stdout): always a JSON decision, `{"decision": "allow"}` or
//! `{"decision": "block", "reason": "..."}` — unlike the Claude protocol,
//! silence is not a valid answer here.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::analyzer::{self, AnalysisContext, Verdict};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HookRequest {
    tool_call: Option<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: Option<String>,
    args: Option<ToolArgs>,
}

#[derive(Debug, Deserialize)]
struct ToolArgs {
    command: Option<String>,
}

/// Process one hook request. Always returns a decision document.
pub fn respond(input: &str, ctx: &AnalysisContext) -> String {
    let request: HookRequest = match serde_json::from_str(input) {
        Ok(request) => request,
        Err(error) => {
            if ctx.strict {
                return block_json(
                    "shellguard strict mode: hook input could not be parsed. \
                     Unset SHELLGUARD_STRICT to fail open.",
                );
            }
            debug!(%error, "unparseable hook input, failing open");
            return allow_json();
        }
    };

    let command = request
        .tool_call
        .as_ref()
        .filter(|call| call.name.as_deref() == Some("run_shell_command"))
        .and_then(|call| call.args.as_ref())
        .and_then(|args| args.command.as_deref());

    let Some(command) = command else {
        return allow_json();
    };
    if command.trim().is_empty() {
        return allow_json();
    }

    match analyzer::analyze(command, ctx) {
        Verdict::Allowed => allow_json(),
        Verdict::Blocked { reason, segment } => {
            block_json(&super::deny_reason(&reason, &segment))
        }
    }
}

fn allow_json() -> String {
    json!({"decision": "allow"}).to_string()
}

fn block_json(reason: &str) -> String {
    json!({"decision": "block", "reason": reason}).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn ctx() -> AnalysisContext {
        AnalysisContext {
            cwd: Some("/home/user/project".to_string()),
            home: Some("/home/user".to_string()),
            ..AnalysisContext::default()
        }
    }

    fn request(command: &str) -> String {
        json!({"toolCall": {"name": "run_shell_command", "args": {"command": command}}})
            .to_string()
    }

    fn decision(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn test_safe_command_allows() {
        let output = respond(&request("git status"), &ctx());
        assert_eq!(decision(&output)["decision"], "allow");
    }

    #[test]
    fn test_dangerous_command_blocked_with_reason() {
        let output = respond(&request("git reset --hard"), &ctx());
        let parsed = decision(&output);
        assert_eq!(parsed["decision"], "block");
        assert!(parsed["reason"].as_str().unwrap().contains("--hard"));
    }

    #[test]
    fn test_other_tool_allows() {
        let input = json!({"toolCall": {"name": "read_file", "args": {"path": "x"}}});
        let output = respond(&input.to_string(), &ctx());
        assert_eq!(decision(&output)["decision"], "allow");
    }

    #[test]
    fn test_invalid_json_allows() {
        let output = respond("garbage", &ctx());
        assert_eq!(decision(&output)["decision"], "allow");
    }

    #[test]
    fn test_strict_mode_invalid_json_blocks() {
        let mut c = ctx();
        c.strict = true;
        let output = respond("garbage", &c);
        assert_eq!(decision(&output)["decision"], "block");
    }

    #[test]
    fn test_missing_command_allows() {
        let input = json!({"toolCall": {"name": "run_shell_command", "args": {}}});
        let output = respond(&input.to_string(), &ctx());
        assert_eq!(decision(&output)["decision"], "allow");
    }
}
