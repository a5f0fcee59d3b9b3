pub mod approval;
pub mod command_filter;
pub mod defaults;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use approval::{
    has_shell_metacharacters, ApprovalGate, AutoApprove, ConsoleApproval, PolicyDecision,
    PolicyGate, PredicateGate,
};
use command_filter::{BlockedCommand, CommandFilter};

use crate::config::{AppConfig, ApprovalMode};
use crate::console::Console;
use crate::error::ExecError;
use crate::exec::{normalize_command, KubeExecutor};

/// Combined safety layer: checks commands against the blocklist, asks the
/// approval gate where required, and delegates allowed commands to the
/// [`KubeExecutor`].
///
/// This is the single entry point the agent's tools use for cluster
/// commands. The blocklist applies to gated and ungated execution alike.
pub struct SafetyLayer {
    command_filter: CommandFilter,
    gate: Box<dyn ApprovalGate>,
    executor: KubeExecutor,
    security_log_path: PathBuf,
}

impl SafetyLayer {
    /// Build a SafetyLayer from the resolved application configuration,
    /// with the approval gate chosen by `config.approval`.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let gate = build_gate(config)?;
        Self::with_gate(config, gate)
    }

    /// Build a SafetyLayer with an explicit approval gate.
    pub fn with_gate(config: &AppConfig, gate: Box<dyn ApprovalGate>) -> anyhow::Result<Self> {
        let command_filter = CommandFilter::new(&config.blocked_patterns)
            .map_err(|e| anyhow::anyhow!("Failed to compile command filter patterns: {}", e))?;

        Ok(Self {
            command_filter,
            gate,
            executor: KubeExecutor::new(config.working_dir.clone(), config.command_timeout_secs),
            security_log_path: config.security_log_path.clone(),
        })
    }

    /// Execute without approval. Blocked commands are logged and answered
    /// with the blocked JSON instead of output.
    pub async fn execute(&self, command: &str) -> Result<String, ExecError> {
        if let Some(blocked) = self.check_blocked(normalize_command(command)) {
            return Ok(blocked.to_json());
        }
        self.executor.run_unconditional(command).await
    }

    /// Execute behind the approval gate. Blocked commands never reach the
    /// gate.
    pub async fn execute_gated(
        &self,
        command: &str,
        console: &dyn Console,
    ) -> Result<String, ExecError> {
        if let Some(blocked) = self.check_blocked(normalize_command(command)) {
            return Ok(blocked.to_json());
        }
        self.executor
            .run_gated(command, self.gate.as_ref(), console)
            .await
    }

    pub fn executor(&self) -> &KubeExecutor {
        &self.executor
    }

    pub fn blocked_pattern_count(&self) -> usize {
        self.command_filter.len()
    }

    pub fn security_log_path(&self) -> &Path {
        &self.security_log_path
    }

    fn check_blocked(&self, command: &str) -> Option<BlockedCommand> {
        let blocked = self.command_filter.check(command)?;
        tracing::warn!(command, reason = %blocked.reason, "Command blocked");
        self.log_blocked_command(&blocked);
        Some(blocked)
    }

    /// Append a JSON line to the security log for a blocked command.
    ///
    /// If the log file cannot be written, a warning is logged via tracing but
    /// the command check is not affected.
    fn log_blocked_command(&self, blocked: &BlockedCommand) {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let log_entry = serde_json::json!({
            "timestamp": timestamp,
            "blocked": true,
            "reason": blocked.reason,
            "command": blocked.command,
        });

        if let Some(parent) = self.security_log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.security_log_path)
        {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{log_entry}") {
                    tracing::warn!(
                        "Failed to write to security log at {}: {}",
                        self.security_log_path.display(),
                        e
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open security log at {}: {}",
                    self.security_log_path.display(),
                    e
                );
            }
        }
    }
}

/// Choose the approval gate for the configured mode.
pub fn build_gate(config: &AppConfig) -> anyhow::Result<Box<dyn ApprovalGate>> {
    let gate: Box<dyn ApprovalGate> = match config.approval {
        ApprovalMode::Prompt => Box::new(ConsoleApproval),
        ApprovalMode::Auto => Box::new(AutoApprove),
        ApprovalMode::Policy => {
            let allow = CommandFilter::new(&config.auto_approve_patterns).map_err(|e| {
                anyhow::anyhow!("Failed to compile auto-approve patterns: {}", e)
            })?;
            Box::new(PolicyGate::new(allow, Box::new(ConsoleApproval)))
        }
    };
    Ok(gate)
}
