use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{Console, Tone};

/// Console backed by the process terminal: styled output on stdout via
/// crossterm, line input from tokio's stdin.
pub struct TerminalConsole {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Console for TerminalConsole {
    fn print(&self, tone: Tone, text: &str) {
        let mut out = std::io::stdout().lock();
        let result = match tone {
            Tone::Plain => writeln!(out, "{text}"),
            Tone::Info => writeln!(out, "{}", text.blue()),
            Tone::Accent => writeln!(out, "{}", text.cyan().bold()),
            Tone::Success => writeln!(out, "{}", text.green()),
            Tone::Warning => writeln!(out, "{}", text.yellow().bold()),
            Tone::Error => writeln!(out, "{}", text.red().bold()),
        };
        if let Err(e) = result.and_then(|_| out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    fn clear(&self) {
        let mut out = std::io::stdout();
        if let Err(e) = crossterm::execute!(out, Clear(ClearType::All), MoveTo(0, 0)) {
            tracing::warn!("Failed to clear terminal: {}", e);
        }
    }

    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        {
            let mut out = std::io::stdout().lock();
            write!(out, "{}", prompt.magenta())?;
            out.flush()?;
        }
        // Lines::next_line is cancel-safe, so a select! in the shell loop may
        // drop this future without losing buffered input.
        let mut lines = self.lines.lock().await;
        lines.next_line().await
    }
}
