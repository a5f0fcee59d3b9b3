//! System prompt for the Kubernetes assistant.
//!
//! The prompt frames the model as a Kubernetes troubleshooter, lists the
//! tools it can call, and states when a command must go through the approval
//! tool. Operators can append site-specific notes by placing a
//! `KUBEWIZARD.md` file in the working directory.

use std::path::Path;

/// File in the working directory whose contents are appended to the prompt.
pub const OPERATOR_NOTES_FILE: &str = "KUBEWIZARD.md";

/// Build the full system prompt.
///
/// A missing notes file is normal and leaves the notes section out. Any
/// other read failure is logged and treated the same way.
pub async fn build_system_prompt(working_dir: &Path, model: &str, tool_descriptions: &str) -> String {
    let notes = load_operator_notes(working_dir).await;
    render_prompt(working_dir, model, tool_descriptions, notes.as_deref())
}

async fn load_operator_notes(working_dir: &Path) -> Option<String> {
    let path = working_dir.join(OPERATOR_NOTES_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(notes) if !notes.trim().is_empty() => Some(notes),
        Ok(_) => None,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Ignoring operator notes at {}: {}", path.display(), e);
            None
        }
    }
}

fn render_prompt(
    working_dir: &Path,
    model: &str,
    tool_descriptions: &str,
    notes: Option<&str>,
) -> String {
    let working_dir = working_dir.display();
    let mut prompt = format!(
        "\
You are a Kubernetes expert. A user has asked you a question about a Kubernetes \
issue they are facing. You need to diagnose the problem and provide a solution.

## Environment
- Model: {model}
- Commands run with `sh -c` in {working_dir}, using the user's kubeconfig

## Available Tools
{tool_descriptions}

## Rules
- Gather facts with read-only commands before drawing conclusions.
- Any command that modifies resources (delete, patch, create, apply, scale, \
edit, label, annotate, rollout, cordon, drain and so on) or reveals \
credentials (secrets, raw kubeconfig) MUST use `kube_tool_with_approve`.
- If the user declines a command, do not retry it. Explain what it would \
have done and ask how to proceed.
- Ask the human only when you cannot find the answer yourself.
- When you have enough information, answer directly without calling a tool. \
Keep the answer concise and include the commands you ran when they help."
    );

    if let Some(notes) = notes {
        prompt.push_str("\n\n## Operator Notes\n\n");
        prompt.push_str(notes.trim_end());
    }

    prompt
}
