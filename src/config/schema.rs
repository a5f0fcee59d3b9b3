use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for kubewizard.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub kubectl: Option<KubectlConfig>,
    pub search: Option<SearchConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    /// 0 = silent, 1 = verbose, 2 = verbose with intermediate steps.
    pub debug_level: Option<u8>,
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct KubectlConfig {
    pub timeout_secs: Option<u64>,
    pub approval: Option<ApprovalMode>,
    pub working_dir: Option<String>,
    /// If specified, fully replaces the default auto-approve list.
    pub auto_approve_patterns: Option<Vec<PatternEntry>>,
    /// If specified, fully replaces the default blocklist.
    pub blocked_patterns: Option<Vec<PatternEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub session_logs: Option<bool>,
    pub log_dir: Option<String>,
    pub security_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternEntry {
    pub pattern: String,
    pub reason: String,
}

/// How gated cluster commands are approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// Ask on the console every time.
    #[default]
    Prompt,
    /// Approve everything without asking.
    Auto,
    /// Auto-approve read-only commands, ask for the rest.
    Policy,
}

/// How much of the agent's work is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Final answers only.
    Silent,
    /// Tool calls are shown as they happen.
    Verbose,
    /// Tool calls, their results and intermediate model text are shown.
    VerboseWithSteps,
}

impl Verbosity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Verbose,
            _ => Verbosity::VerboseWithSteps,
        }
    }
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub verbosity: Verbosity,
    pub max_iterations: usize,
    pub command_timeout_secs: u64,
    pub approval: ApprovalMode,
    pub working_dir: PathBuf,
    pub auto_approve_patterns: Vec<(String, String)>,
    pub blocked_patterns: Vec<(String, String)>,
    pub search_max_results: usize,
    pub session_logs: bool,
    pub log_dir: PathBuf,
    pub security_log_path: PathBuf,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub model: Option<String>,
    pub debug_level: Option<u8>,
    pub max_iterations: Option<usize>,
    pub command_timeout_secs: Option<u64>,
    pub approval: Option<ApprovalMode>,
    pub working_dir: Option<PathBuf>,
    pub auto_approve_patterns: Option<Vec<(String, String)>>,
    pub blocked_patterns: Option<Vec<(String, String)>>,
    pub search_max_results: Option<usize>,
    pub session_logs: Option<bool>,
    pub log_dir: Option<PathBuf>,
    pub security_log_path: Option<PathBuf>,
}

fn entries_to_pairs(entries: Vec<PatternEntry>) -> Vec<(String, String)> {
    entries.into_iter().map(|e| (e.pattern, e.reason)).collect()
}

impl ConfigFile {
    /// Flatten the sectioned file layout into a mergeable layer.
    pub fn to_partial(self) -> PartialConfig {
        let general = self.general;
        let kubectl = self.kubectl;
        let logging = self.logging;

        let (model, debug_level, max_iterations) = match general {
            Some(g) => (g.model, g.debug_level, g.max_iterations),
            None => (None, None, None),
        };

        let mut partial = PartialConfig {
            model,
            debug_level,
            max_iterations,
            search_max_results: self.search.and_then(|s| s.max_results),
            ..Default::default()
        };

        if let Some(k) = kubectl {
            partial.command_timeout_secs = k.timeout_secs;
            partial.approval = k.approval;
            partial.working_dir = k.working_dir.map(PathBuf::from);
            partial.auto_approve_patterns = k.auto_approve_patterns.map(entries_to_pairs);
            partial.blocked_patterns = k.blocked_patterns.map(entries_to_pairs);
        }

        if let Some(l) = logging {
            partial.session_logs = l.session_logs;
            partial.log_dir = l.log_dir.map(PathBuf::from);
            partial.security_log_path = l.security_log.map(PathBuf::from);
        }

        partial
    }
}
