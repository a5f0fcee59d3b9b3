//! Display surface shared by the shell, its handlers and the approval gate.
//!
//! Everything user-facing goes through the [`Console`] trait so the read
//! loop and every prompt can be driven from a script in tests
//! ([`BufferConsole`]) or from the real terminal ([`TerminalConsole`]).

pub mod buffer;
pub mod prompt;
pub mod terminal;

pub use buffer::BufferConsole;
pub use prompt::{ask, confirm, parse_confirmation};
pub use terminal::TerminalConsole;

/// Visual emphasis of a printed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Info,
    Accent,
    Success,
    Warning,
    Error,
}

/// A line-oriented display surface with an input source.
///
/// Methods take `&self` so the shell can keep printing interrupt notices
/// while a handler is borrowing the console.
#[async_trait::async_trait]
pub trait Console: Send + Sync {
    /// Print one line of text.
    fn print(&self, tone: Tone, text: &str);

    /// Clear the visible display.
    fn clear(&self);

    /// Show `prompt` and read one line. `Ok(None)` means end of input.
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// before completion must not lose a line.
    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>>;
}
