use std::path::PathBuf;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid config value for `{field}`: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while building or driving the interactive shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Command `{0}` is already registered")]
    DuplicateCommand(String),
}

/// Errors related to privileged command execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to spawn shell process: {0}")]
    SpawnFailed(String),

    #[error("Command timed out after {timeout_secs}s; partial output: {partial_output}")]
    TimedOut {
        timeout_secs: u64,
        partial_output: String,
    },

    #[error("Command failed with exit status {}: {stderr}", exit_status_label(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

/// Errors related to the agent and its subsystems.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Session logging error: {0}")]
    LoggingError(String),
}
