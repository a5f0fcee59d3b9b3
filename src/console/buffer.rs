use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Console, Tone};

/// In-memory console: input comes from a queue of scripted lines and every
/// printed line is captured.
///
/// When the script runs dry, [`read_line`](Console::read_line) reports end
/// of input.
#[derive(Debug, Default)]
pub struct BufferConsole {
    input: Mutex<VecDeque<String>>,
    output: Mutex<Vec<(Tone, String)>>,
    clears: Mutex<usize>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a console whose input is the given lines, in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::new();
        for line in lines {
            console.push_input(line);
        }
        console
    }

    /// Append a line to the input script.
    pub fn push_input(&self, line: impl Into<String>) {
        self.input.lock().unwrap().push_back(line.into());
    }

    /// All printed lines, without tone.
    pub fn lines(&self) -> Vec<String> {
        self.output
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// All printed lines with their tone.
    pub fn entries(&self) -> Vec<(Tone, String)> {
        self.output.lock().unwrap().clone()
    }

    /// Printed output joined with newlines.
    pub fn transcript(&self) -> String {
        self.lines().join("\n")
    }

    /// Number of times the display was cleared.
    pub fn clear_count(&self) -> usize {
        *self.clears.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Console for BufferConsole {
    fn print(&self, tone: Tone, text: &str) {
        self.output.lock().unwrap().push((tone, text.to_string()));
    }

    fn clear(&self) {
        *self.clears.lock().unwrap() += 1;
    }

    async fn read_line(&self, _prompt: &str) -> std::io::Result<Option<String>> {
        Ok(self.input.lock().unwrap().pop_front())
    }
}
