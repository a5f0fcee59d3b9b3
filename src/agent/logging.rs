//! Per-session JSONL transcript of a chat session.
//!
//! One file per run, `session-{timestamp}.jsonl` under the log directory.
//! Every line is a [`LogEntry`]: questions, model text, tool calls and
//! their results, answers, errors, and a closing `session_end` record.
//! Each event is flushed as soon as it is written.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::AgentError;

/// Returns the current UTC time as an ISO 8601 string with milliseconds.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A structured log entry serialized as a single JSON line.
///
/// Tagged with `event_type` so each line is self-describing for replay.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum LogEntry {
    #[serde(rename = "session_start")]
    SessionStart {
        timestamp: String,
        model: String,
        working_dir: String,
    },

    /// A question forwarded from the shell to the agent.
    #[serde(rename = "user_input")]
    UserInput {
        timestamp: String,
        turn: u64,
        content: String,
    },

    /// Model text produced alongside tool calls.
    #[serde(rename = "assistant_text")]
    AssistantText {
        timestamp: String,
        turn: u64,
        content: String,
    },

    #[serde(rename = "tool_call")]
    ToolCall {
        timestamp: String,
        turn: u64,
        call_id: String,
        fn_name: String,
        fn_arguments: serde_json::Value,
    },

    #[serde(rename = "tool_result")]
    ToolResult {
        timestamp: String,
        turn: u64,
        call_id: String,
        fn_name: String,
        result: String,
    },

    /// The final answer shown to the user.
    #[serde(rename = "answer")]
    Answer {
        timestamp: String,
        turn: u64,
        content: String,
    },

    #[serde(rename = "error")]
    Error {
        timestamp: String,
        turn: u64,
        message: String,
    },

    #[serde(rename = "session_end")]
    SessionEnd {
        timestamp: String,
        total_turns: u64,
        reason: String,
    },
}

/// Append-only JSONL logger for assistant sessions.
pub struct SessionLogger {
    writer: BufWriter<fs::File>,
    log_path: PathBuf,
}

impl SessionLogger {
    /// Create a new session log file in `log_dir`, creating the directory if
    /// needed. Colons in the timestamp are replaced by dashes for
    /// filesystem safety.
    pub fn new(log_dir: &Path) -> Result<Self, AgentError> {
        fs::create_dir_all(log_dir).map_err(|e| {
            AgentError::LoggingError(format!("cannot create {}: {e}", log_dir.display()))
        })?;

        let session_id = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let log_path = log_dir.join(format!("session-{session_id}.jsonl"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                AgentError::LoggingError(format!("cannot open {}: {e}", log_path.display()))
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path,
        })
    }

    /// Serialize a log entry as a single JSON line and flush.
    pub fn log_event(&mut self, event: &LogEntry) -> Result<(), AgentError> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| AgentError::LoggingError(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .map_err(|e| AgentError::LoggingError(e.to_string()))
    }

    /// Return the path to the current session log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn log_session_start(&mut self, model: &str, working_dir: &Path) -> Result<(), AgentError> {
        self.log_event(&LogEntry::SessionStart {
            timestamp: now_iso(),
            model: model.to_string(),
            working_dir: working_dir.display().to_string(),
        })
    }

    pub fn log_session_end(&mut self, total_turns: u64, reason: &str) -> Result<(), AgentError> {
        self.log_event(&LogEntry::SessionEnd {
            timestamp: now_iso(),
            total_turns,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let file = fs::File::open(path).expect("open log");
        std::io::BufReader::new(file)
            .lines()
            .map(|l| serde_json::from_str(&l.expect("read line")).expect("valid JSON"))
            .collect()
    }

    #[test]
    fn creates_log_file_in_log_dir() {
        let tmp = TempDir::new().unwrap();
        let log_dir = tmp.path().join("logs");
        let logger = SessionLogger::new(&log_dir).unwrap();

        assert!(log_dir.is_dir());
        assert!(logger.log_path().starts_with(&log_dir));
        let name = logger.log_path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("session-"));
        assert!(name.ends_with(".jsonl"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn session_events_are_written_one_per_line() {
        let tmp = TempDir::new().unwrap();
        let mut logger = SessionLogger::new(tmp.path()).unwrap();

        logger
            .log_session_start("gpt-4o-mini", Path::new("/srv/ops"))
            .unwrap();
        logger
            .log_event(&LogEntry::UserInput {
                timestamp: now_iso(),
                turn: 1,
                content: "why is nginx not ready".to_string(),
            })
            .unwrap();
        logger
            .log_event(&LogEntry::ToolCall {
                timestamp: now_iso(),
                turn: 1,
                call_id: "call_1".to_string(),
                fn_name: "kube_tool".to_string(),
                fn_arguments: serde_json::json!({"commands": "kubectl get pods"}),
            })
            .unwrap();
        logger.log_session_end(1, "end_of_input").unwrap();

        let entries = read_lines(logger.log_path());
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0]["event_type"], "session_start");
        assert_eq!(entries[0]["model"], "gpt-4o-mini");
        assert_eq!(entries[0]["working_dir"], "/srv/ops");
        assert_eq!(entries[1]["event_type"], "user_input");
        assert_eq!(entries[2]["fn_arguments"]["commands"], "kubectl get pods");
        assert_eq!(entries[3]["event_type"], "session_end");
        assert_eq!(entries[3]["reason"], "end_of_input");
    }

    #[test]
    fn answer_and_error_events() {
        let tmp = TempDir::new().unwrap();
        let mut logger = SessionLogger::new(tmp.path()).unwrap();

        logger
            .log_event(&LogEntry::Answer {
                timestamp: now_iso(),
                turn: 2,
                content: "The image tag does not exist.".to_string(),
            })
            .unwrap();
        logger
            .log_event(&LogEntry::Error {
                timestamp: now_iso(),
                turn: 3,
                message: "LLM error: 401".to_string(),
            })
            .unwrap();

        let entries = read_lines(logger.log_path());
        assert_eq!(entries[0]["event_type"], "answer");
        assert_eq!(entries[0]["turn"], 2);
        assert_eq!(entries[1]["event_type"], "error");
        assert_eq!(entries[1]["message"], "LLM error: 401");
    }
}
