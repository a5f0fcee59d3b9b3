//! Approval gates: decide whether a privileged command may run.
//!
//! A gate is evaluated once per execution attempt and nothing is remembered
//! between calls. The console is passed in so interactive gates can ask the
//! human; non-interactive gates ignore it.

use regex::Regex;

use super::command_filter::CommandFilter;
use crate::console::{confirm, Console, Tone};

const APPROVAL_QUESTION: &str = "✅ Do you approve of the following input?";

/// Characters that let one command line run more than one program, or
/// redirect output.
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '$', '`', '<', '>', '(', ')', '\n'];

/// A predicate over a privileged command string.
#[async_trait::async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn approve(&self, console: &dyn Console, command: &str) -> bool;
}

/// Shows the command and asks a yes/no question defaulting to "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleApproval;

#[async_trait::async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn approve(&self, console: &dyn Console, command: &str) -> bool {
        match confirm(console, APPROVAL_QUESTION, command, false).await {
            Ok(approved) => approved,
            Err(e) => {
                tracing::warn!("Approval prompt failed, treating as denied: {}", e);
                false
            }
        }
    }
}

/// Approves everything. For non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait::async_trait]
impl ApprovalGate for AutoApprove {
    async fn approve(&self, _console: &dyn Console, _command: &str) -> bool {
        true
    }
}

/// Wraps any caller-supplied predicate over the command string.
pub struct PredicateGate<F>(F);

impl<F> PredicateGate<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

#[async_trait::async_trait]
impl<F> ApprovalGate for PredicateGate<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn approve(&self, _console: &dyn Console, command: &str) -> bool {
        (self.0)(command)
    }
}

/// Outcome of [`PolicyGate::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Matched the auto-approve list; the string is the matching reason.
    Approve(String),
    /// Needs a decision from the fallback gate.
    Ask,
}

/// Auto-approves commands on an allow list and defers everything else.
///
/// A command only qualifies for auto-approval if it is a single plain
/// invocation (no shell metacharacters) and does not mention secrets.
pub struct PolicyGate {
    allow: CommandFilter,
    sensitive: Regex,
    fallback: Box<dyn ApprovalGate>,
}

impl PolicyGate {
    pub fn new(allow: CommandFilter, fallback: Box<dyn ApprovalGate>) -> Self {
        Self {
            allow,
            sensitive: Regex::new(r"(?i)\bsecrets?\b").expect("static regex is valid"),
            fallback,
        }
    }

    pub fn decide(&self, command: &str) -> PolicyDecision {
        if has_shell_metacharacters(command) || self.sensitive.is_match(command) {
            return PolicyDecision::Ask;
        }
        match self.allow.check(command) {
            Some(matched) => PolicyDecision::Approve(matched.reason),
            None => PolicyDecision::Ask,
        }
    }
}

#[async_trait::async_trait]
impl ApprovalGate for PolicyGate {
    async fn approve(&self, console: &dyn Console, command: &str) -> bool {
        match self.decide(command) {
            PolicyDecision::Approve(reason) => {
                tracing::debug!(command, reason = %reason, "Auto-approved");
                console.print(Tone::Info, &format!("Auto-approved ({reason}): {command}"));
                true
            }
            PolicyDecision::Ask => self.fallback.approve(console, command).await,
        }
    }
}

pub fn has_shell_metacharacters(command: &str) -> bool {
    command.contains(SHELL_METACHARACTERS)
}
