//! Tool-gated execution of cluster commands (`kubectl`, `helm`).
//!
//! [`KubeExecutor::run_unconditional`] runs a command and returns its output
//! as text. [`KubeExecutor::run_gated`] first asks an [`ApprovalGate`]; a
//! denial is a normal return value ([`REFUSAL_MESSAGE`]), never an error.

use std::path::PathBuf;

use super::shell::execute_shell;
use crate::console::Console;
use crate::error::ExecError;
use crate::safety::ApprovalGate;

/// Returned by [`KubeExecutor::run_gated`] when approval is withheld.
pub const REFUSAL_MESSAGE: &str = "Command execution aborted by user, not approved.";

const QUOTE_CHARS: [char; 2] = ['`', '"'];

/// Trim a command and strip one layer of surrounding quote characters
/// (backtick or double quote).
///
/// Model output often arrives wrapped, e.g. `` `kubectl get pods` ``, and
/// sometimes only half wrapped. When both ends are quote characters both
/// are removed. A quote on one end only is removed when that character is
/// unbalanced in the command, so `` `kubectl get pods `` loses its stray
/// backtick while a trailing quoted argument such as
/// `-o jsonpath="{.items}"` keeps its closing quote. The content in
/// between is left untouched.
pub fn normalize_command(raw: &str) -> &str {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next().filter(|c| QUOTE_CHARS.contains(c));
    let last = chars.next_back().filter(|c| QUOTE_CHARS.contains(c));
    let unbalanced = |q: char| trimmed.matches(q).count() % 2 == 1;

    match (first, last) {
        (Some(f), Some(l)) => &trimmed[f.len_utf8()..trimmed.len() - l.len_utf8()],
        (Some(f), None) if unbalanced(f) => &trimmed[f.len_utf8()..],
        (None, Some(l)) if unbalanced(l) => &trimmed[..trimmed.len() - l.len_utf8()],
        _ => trimmed,
    }
}

/// Runs privileged cluster commands in a fixed working directory.
#[derive(Debug, Clone)]
pub struct KubeExecutor {
    working_dir: PathBuf,
    timeout_secs: u64,
}

impl KubeExecutor {
    pub fn new(working_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout_secs,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Execute the command without asking anyone.
    ///
    /// Returns stdout, with any stderr appended (stderr alone when stdout is
    /// empty). A non-zero exit, a timeout, or a spawn failure is an
    /// [`ExecError`].
    pub async fn run_unconditional(&self, command: &str) -> Result<String, ExecError> {
        self.execute(normalize_command(command)).await
    }

    /// Ask `gate` for approval, then execute.
    ///
    /// The gate sees the normalized command. If it declines, nothing runs
    /// and [`REFUSAL_MESSAGE`] is returned. Each call asks and executes
    /// afresh; nothing is cached.
    pub async fn run_gated(
        &self,
        command: &str,
        gate: &dyn ApprovalGate,
        console: &dyn Console,
    ) -> Result<String, ExecError> {
        let command = normalize_command(command);
        if !gate.approve(console, command).await {
            tracing::info!(command, "Cluster command refused");
            return Ok(REFUSAL_MESSAGE.to_string());
        }
        self.execute(command).await
    }

    async fn execute(&self, command: &str) -> Result<String, ExecError> {
        tracing::info!(command, "Executing cluster command");

        let result = execute_shell(command, &self.working_dir, self.timeout_secs).await?;

        if result.timed_out {
            return Err(ExecError::TimedOut {
                timeout_secs: self.timeout_secs,
                partial_output: combine_output(&result.stdout, &result.stderr),
            });
        }
        if result.exit_code != Some(0) {
            tracing::info!(command, exit_code = ?result.exit_code, "Cluster command failed");
            return Err(ExecError::Failed {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(combine_output(&result.stdout, &result.stderr))
    }
}

fn combine_output(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}{stderr}"),
    }
}
