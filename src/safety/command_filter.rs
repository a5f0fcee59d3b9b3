use regex::RegexSet;

use super::defaults::default_blocklist;

/// Checks commands against a set of patterns, each with a reason.
#[derive(Debug, Clone)]
pub struct CommandFilter {
    patterns: RegexSet,
    pattern_reasons: Vec<String>,
}

/// Information about a matched (blocked) command.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockedCommand {
    pub blocked: bool,
    pub reason: String,
    pub command: String,
}

impl BlockedCommand {
    /// Structured form handed back to the model instead of command output.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{{\"blocked\":true,\"reason\":{:?}}}", self.reason)
        })
    }
}

impl CommandFilter {
    /// Create a new filter from a list of (pattern, reason) tuples.
    /// The RegexSet is compiled once for efficient multi-pattern matching.
    pub fn new(patterns: &[(String, String)]) -> Result<Self, regex::Error> {
        let (regexes, reasons): (Vec<_>, Vec<_>) = patterns.iter().cloned().unzip();
        Ok(Self {
            patterns: RegexSet::new(&regexes)?,
            pattern_reasons: reasons,
        })
    }

    /// Filter built from the default cluster blocklist.
    pub fn from_defaults() -> Result<Self, regex::Error> {
        Self::new(&default_blocklist())
    }

    /// Returns Some(BlockedCommand) if any pattern matches, None otherwise.
    /// The reason is that of the first matching pattern.
    pub fn check(&self, command: &str) -> Option<BlockedCommand> {
        let first = self.patterns.matches(command).into_iter().next()?;
        Some(BlockedCommand {
            blocked: true,
            reason: self.pattern_reasons[first].clone(),
            command: command.to_string(),
        })
    }

    pub fn is_match(&self, command: &str) -> bool {
        self.patterns.is_match(command)
    }

    pub fn len(&self) -> usize {
        self.pattern_reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_reasons.is_empty()
    }
}
