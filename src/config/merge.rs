use super::schema::{AppConfig, PartialConfig, Verbosity};
use crate::error::ConfigError;
use crate::safety::defaults::{default_auto_approve, default_blocklist};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DEBUG_LEVEL: u8 = 1;
pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SEARCH_RESULTS: usize = 10;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For pattern lists: REPLACE semantics (if self has Some, use it entirely).
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            model: self.model.or(fallback.model),
            debug_level: self.debug_level.or(fallback.debug_level),
            max_iterations: self.max_iterations.or(fallback.max_iterations),
            command_timeout_secs: self.command_timeout_secs.or(fallback.command_timeout_secs),
            approval: self.approval.or(fallback.approval),
            working_dir: self.working_dir.or(fallback.working_dir),
            auto_approve_patterns: self.auto_approve_patterns.or(fallback.auto_approve_patterns),
            blocked_patterns: self.blocked_patterns.or(fallback.blocked_patterns),
            search_max_results: self.search_max_results.or(fallback.search_max_results),
            session_logs: self.session_logs.or(fallback.session_logs),
            log_dir: self.log_dir.or(fallback.log_dir),
            security_log_path: self.security_log_path.or(fallback.security_log_path),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    pub fn finalize(self) -> Result<AppConfig, ConfigError> {
        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let command_timeout_secs = self.command_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let log_dir = self.log_dir.unwrap_or_else(default_log_dir);
        let security_log_path = self
            .security_log_path
            .unwrap_or_else(|| log_dir.join("security.log"));
        let working_dir = self
            .working_dir
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(AppConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            verbosity: Verbosity::from_level(self.debug_level.unwrap_or(DEFAULT_DEBUG_LEVEL)),
            max_iterations,
            command_timeout_secs,
            approval: self.approval.unwrap_or_default(),
            working_dir,
            auto_approve_patterns: self
                .auto_approve_patterns
                .unwrap_or_else(default_auto_approve),
            blocked_patterns: self.blocked_patterns.unwrap_or_else(default_blocklist),
            search_max_results: self.search_max_results.unwrap_or(DEFAULT_SEARCH_RESULTS),
            session_logs: self.session_logs.unwrap_or(true),
            log_dir,
            security_log_path,
        })
    }
}

/// Platform data directory for session and security logs.
/// Linux: ~/.local/share/kubewizard/logs
fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "kubewizard")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from(".kubewizard-logs"))
}
