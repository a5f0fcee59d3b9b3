//! Human-in-the-loop prompts built on top of a [`Console`].

use super::{Console, Tone};

/// Ask a free-form question and return the trimmed answer.
///
/// Returns `Ok(None)` if input ended before an answer was given.
pub async fn ask(console: &dyn Console, prompt: &str) -> std::io::Result<Option<String>> {
    let answer = console.read_line(&format!("{prompt}> ")).await?;
    Ok(answer.map(|line| line.trim().to_string()))
}

/// Ask a yes/no question.
///
/// `extra` (typically the command awaiting approval) is shown on its own
/// line under the message. Empty input or end of input yields `default`;
/// unrecognised answers re-prompt.
pub async fn confirm(
    console: &dyn Console,
    message: &str,
    extra: &str,
    default: bool,
) -> std::io::Result<bool> {
    console.print(Tone::Plain, message);
    if !extra.is_empty() {
        console.print(Tone::Accent, extra);
    }

    let choices = if default { "[Y/n]: " } else { "[y/N]: " };
    loop {
        let Some(answer) = console.read_line(choices).await? else {
            return Ok(default);
        };
        match parse_confirmation(&answer, default) {
            Some(decision) => return Ok(decision),
            None => console.print(Tone::Error, "Please enter Y or N"),
        }
    }
}

/// Interpret a yes/no answer. `None` means the answer was not understood.
pub fn parse_confirmation(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
