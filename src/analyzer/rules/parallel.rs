//! GNU `parallel` rules.
//!
//! Three shapes matter:
//! - command templates expanding `rm -rf` over a `:::` argument list,
//! - shell-launcher templates (`parallel bash -c '...' ::: ...`) where the
//!   placeholder feeds the script itself,
//! - the commands-list form (`parallel ::: 'cmd1' 'cmd2'`) where every
//!   argument IS a command line of its own.

use super::Block;
use super::rm;
use crate::analyzer::extract;
use crate::analyzer::wrappers;

/// parallel options that consume the next token.
const OPTS_WITH_VALUE: &[&str] = &[
    "-a", "-I", "-j", "-n", "-S", "--arg-file", "--colsep", "--halt", "--jobs",
    "--max-args", "--results", "--sshlogin", "--timeout",
];

/// Replacement tokens parallel substitutes per argument.
const PLACEHOLDERS: &[&str] = &["{}", "{.}", "{/}", "{//}", "{/.}", "{#}", "{%}"];

fn template_start(args: &[String]) -> usize {
    let mut i = 0;
    while i < args.len() {
        let tok = args[i].as_str();
        if tok == ":::" || tok == "::::" {
            return i;
        }
        if OPTS_WITH_VALUE.contains(&tok) {
            i += 2;
            continue;
        }
        if tok.starts_with('-') && tok.len() > 1 {
            i += 1;
            continue;
        }
        break;
    }
    i
}

fn is_literal(arg: &str) -> bool {
    !arg.contains('$') && !arg.contains('`')
}

pub fn analyze(
    args: &[String],
    rm_ctx: &rm::RmContext<'_>,
    segment: &str,
    recurse: &dyn Fn(&str) -> Option<Block>,
) -> Option<Block> {
    let start = template_start(args);
    let rest = &args[start..];

    let sep = rest.iter().position(|t| t == ":::" || t == "::::");
    let (template, lists) = match sep {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, &rest[rest.len()..]),
    };

    // Every non-separator token after the first ::: is a candidate argument.
    let list_args: Vec<&String> = lists
        .iter()
        .filter(|t| *t != ":::" && *t != "::::")
        .collect();

    if template.is_empty() {
        // Commands-list form: each argument is its own command line.
        for command in &list_args {
            if let Some(block) = recurse(command) {
                return Some(block);
            }
        }
        return None;
    }

    let stripped = wrappers::strip_wrappers(template);
    let head = stripped.tokens.first().map(|t| wrappers::normalize_head(t))?;
    let template_args = &stripped.tokens[1..];

    if extract::is_shell_launcher(&head) && extract::embedded_shell_command(template_args).is_some()
    {
        return Some(Block {
            reason: format!(
                "parallel feeding arguments into '{head} -c' executes each argument as \
                 shell code."
            ),
            segment: segment.to_string(),
        });
    }

    if head == "rm" && rm::has_recursive_force(template_args) {
        // Expand the template once per literal argument and judge each
        // concrete rm invocation.
        let has_placeholder = template_args
            .iter()
            .any(|t| PLACEHOLDERS.contains(&t.as_str()));

        for arg in list_args.iter().filter(|a| is_literal(a)) {
            let expanded: Vec<String> = if has_placeholder {
                template_args
                    .iter()
                    .map(|t| {
                        if PLACEHOLDERS.contains(&t.as_str()) {
                            (*arg).clone()
                        } else {
                            t.clone()
                        }
                    })
                    .collect()
            } else {
                let mut v: Vec<String> = template_args.to_vec();
                v.push((*arg).clone());
                v
            };
            if let Some(block) = rm::analyze(&expanded, rm_ctx, segment) {
                return Some(block);
            }
        }
        // A template with no argument list at all is still a plain rm -rf.
        if list_args.is_empty() {
            return rm::analyze(template_args, rm_ctx, segment);
        }
    }

    None
}
