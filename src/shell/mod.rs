//! Interactive command shell.
//!
//! [`Shell::run`] drives a read loop over a [`Console`]: each line is
//! classified by its first whitespace-delimited token (case-insensitive) and
//! dispatched to a registered [`Handler`], a built-in (`help`, `exit`,
//! `clear`), or the fallback handler. Ctrl-C presses arrive on a channel
//! (see [`session::spawn_ctrl_c_listener`]) and are observed both while
//! waiting for input and while a handler runs; two in a row with no
//! dispatch in between end the session.

pub mod handler;
pub mod registry;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

pub use handler::{FnHandler, Flow, Handler};
pub use registry::{Builtin, Entry, Registry};
pub use session::{spawn_ctrl_c_listener, InterruptAction, SessionState};

use crate::console::{Console, TerminalConsole, Tone};
use crate::error::ShellError;

const FAREWELL: &str = "Goodbye!";
const END_OF_INPUT: &str = "Exiting...";
const INTERRUPT_WARNING: &str = "Press Ctrl+C again to exit";
const UNKNOWN_COMMAND: &str = "Unknown command. Type 'help' for a list of available commands.";
const DEFAULT_FALLBACK_DESCRIPTION: &str = "Default handler.";
const FALLBACK_LABEL: &str = "*";

/// Pause after the first interrupt so the warning is not garbled by the
/// terminal echoing `^C`.
pub const DEFAULT_INTERRUPT_PAUSE: Duration = Duration::from_millis(500);

/// Why [`Shell::run`] returned. Every reason maps to a clean exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    EndOfInput,
    ExitCommand,
    Interrupted,
}

enum Fallback {
    Unknown,
    Custom(Arc<dyn Handler>),
}

impl Fallback {
    fn description(&self) -> &str {
        match self {
            Fallback::Unknown => DEFAULT_FALLBACK_DESCRIPTION,
            Fallback::Custom(h) => h.description(),
        }
    }
}

enum Target {
    Builtin(Builtin),
    Custom(Arc<dyn Handler>),
    Unknown,
}

enum ReadEvent {
    Interrupt,
    Line(std::io::Result<Option<String>>),
}

/// Builder for [`Shell`]. User handlers are registered first; built-ins are
/// added afterwards only for names no user handler has claimed.
pub struct ShellBuilder {
    name: String,
    description: String,
    console: Option<Arc<dyn Console>>,
    handlers: Vec<Arc<dyn Handler>>,
    fallback: Option<Arc<dyn Handler>>,
    interrupts: Option<mpsc::UnboundedReceiver<()>>,
    interrupt_pause: Duration,
}

impl ShellBuilder {
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Handler for input whose first token matches no registered command.
    pub fn fallback(mut self, handler: impl Handler + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn interrupts(mut self, interrupts: mpsc::UnboundedReceiver<()>) -> Self {
        self.interrupts = Some(interrupts);
        self
    }

    pub fn interrupt_pause(mut self, pause: Duration) -> Self {
        self.interrupt_pause = pause;
        self
    }

    pub fn build(self) -> Result<Shell, ShellError> {
        let mut registry = Registry::new();
        for handler in self.handlers {
            registry.register(handler)?;
        }
        for builtin in Builtin::ALL {
            registry.register_builtin(builtin);
        }

        // Without a signal source the receiver is closed immediately and
        // the interrupt branches stay disabled.
        let interrupts = self
            .interrupts
            .unwrap_or_else(|| mpsc::unbounded_channel().1);

        Ok(Shell {
            name: self.name,
            description: self.description,
            console: self
                .console
                .unwrap_or_else(|| Arc::new(TerminalConsole::new())),
            registry,
            fallback: self.fallback.map_or(Fallback::Unknown, Fallback::Custom),
            session: SessionState::new(),
            interrupts,
            interrupt_pause: self.interrupt_pause,
        })
    }
}

/// The interactive read-dispatch loop and its handler registry.
pub struct Shell {
    name: String,
    description: String,
    console: Arc<dyn Console>,
    registry: Registry,
    fallback: Fallback,
    session: SessionState,
    interrupts: mpsc::UnboundedReceiver<()>,
    interrupt_pause: Duration,
}

impl Shell {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ShellBuilder {
        ShellBuilder {
            name: name.into(),
            description: description.into(),
            console: None,
            handlers: Vec::new(),
            fallback: None,
            interrupts: None,
            interrupt_pause: DEFAULT_INTERRUPT_PAUSE,
        }
    }

    /// Add a handler after construction. Fails if the name is taken,
    /// including by a built-in.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<(), ShellError> {
        self.registry.register(handler)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run the read loop until end of input, an exit command, or two
    /// consecutive interrupts.
    pub async fn run(&mut self) -> ExitReason {
        self.print_welcome();
        let prompt = format!("{}> ", self.name.to_lowercase());

        loop {
            let event = tokio::select! {
                biased;
                Some(()) = self.interrupts.recv() => ReadEvent::Interrupt,
                line = self.console.read_line(&prompt) => ReadEvent::Line(line),
            };

            match event {
                ReadEvent::Interrupt => {
                    if let Some(reason) = self.handle_interrupt().await {
                        return reason;
                    }
                }
                ReadEvent::Line(Ok(Some(line))) => {
                    if !line.is_empty() {
                        self.session.push_history(&line);
                    }
                    if let Some(reason) = self.dispatch(&line).await {
                        return reason;
                    }
                }
                ReadEvent::Line(Ok(None)) => {
                    self.console.print(Tone::Error, END_OF_INPUT);
                    return ExitReason::EndOfInput;
                }
                ReadEvent::Line(Err(e)) => {
                    tracing::error!("Failed to read input: {}", e);
                    self.console.print(Tone::Error, END_OF_INPUT);
                    return ExitReason::EndOfInput;
                }
            }
        }
    }

    /// Dispatch one raw input line.
    ///
    /// Blank input prints an empty line and does nothing else. Otherwise the
    /// interrupt counter is reset and the handler for the first token (or
    /// the fallback) receives the original, untrimmed line. Returns
    /// `Some(reason)` when the shell should stop.
    pub async fn dispatch(&mut self, raw: &str) -> Option<ExitReason> {
        let Some(command) = raw.split_whitespace().next().map(str::to_lowercase) else {
            self.console.print(Tone::Plain, "");
            return None;
        };

        self.session.reset_interrupts();

        let target = match self.registry.get(&command) {
            Some(Entry::Builtin(builtin)) => Target::Builtin(*builtin),
            Some(Entry::Custom(handler)) => Target::Custom(Arc::clone(handler)),
            None => match &self.fallback {
                Fallback::Custom(handler) => Target::Custom(Arc::clone(handler)),
                Fallback::Unknown => Target::Unknown,
            },
        };

        tracing::debug!(command = %command, "Dispatching");

        match target {
            Target::Builtin(builtin) => self.run_builtin(builtin),
            Target::Unknown => {
                self.console.print(Tone::Error, UNKNOWN_COMMAND);
                None
            }
            Target::Custom(handler) => self.invoke(&command, handler, raw).await,
        }
    }

    /// Await a handler while still reacting to interrupts. The handler is
    /// never cancelled by a single interrupt.
    async fn invoke(
        &mut self,
        command: &str,
        handler: Arc<dyn Handler>,
        raw: &str,
    ) -> Option<ExitReason> {
        let console = Arc::clone(&self.console);
        let invocation = handler.invoke(console.as_ref(), raw);
        tokio::pin!(invocation);

        let result = loop {
            tokio::select! {
                biased;
                result = &mut invocation => break result,
                Some(()) = self.interrupts.recv() => {
                    if let Some(reason) = self.handle_interrupt().await {
                        return Some(reason);
                    }
                }
            }
        };

        match result {
            Ok(Flow::Continue) => None,
            Ok(Flow::Exit) => Some(ExitReason::ExitCommand),
            Err(e) => {
                tracing::error!(command = %command, "Handler failed: {:#}", e);
                self.console.print(Tone::Error, &format!("Error: {e:#}"));
                None
            }
        }
    }

    fn run_builtin(&self, builtin: Builtin) -> Option<ExitReason> {
        match builtin {
            Builtin::Help => {
                self.print_help();
                None
            }
            Builtin::Exit => {
                self.console.print(Tone::Accent, FAREWELL);
                Some(ExitReason::ExitCommand)
            }
            Builtin::Clear => {
                self.console.clear();
                None
            }
        }
    }

    async fn handle_interrupt(&mut self) -> Option<ExitReason> {
        match self.session.record_interrupt() {
            InterruptAction::Warn => {
                self.console.print(Tone::Warning, INTERRUPT_WARNING);
                tokio::time::sleep(self.interrupt_pause).await;
                None
            }
            InterruptAction::Terminate => {
                self.console.print(Tone::Accent, FAREWELL);
                Some(ExitReason::Interrupted)
            }
        }
    }

    fn print_welcome(&self) {
        self.console
            .print(Tone::Plain, &format!("🎉 Welcome to {}!", self.name));
        self.console.print(Tone::Plain, &self.description);
        self.console
            .print(Tone::Plain, "Type 'help' to see available commands.");
        self.console.print(Tone::Accent, &self.name);
    }

    /// Render the help listing: every command padded to the longest name,
    /// then the fallback under the `*` label.
    pub fn help_lines(&self) -> Vec<String> {
        let width = self.registry.name_width();
        let mut lines = vec!["Available commands:".to_string()];
        for entry in self.registry.entries() {
            lines.push(format!(
                "  - {:<width$}:  {}",
                entry.name(),
                entry.description()
            ));
        }
        lines.push(format!(
            "  - {:<width$}:  {}",
            FALLBACK_LABEL,
            self.fallback.description()
        ));
        lines
    }

    fn print_help(&self) {
        for (i, line) in self.help_lines().iter().enumerate() {
            let tone = if i == 0 { Tone::Accent } else { Tone::Info };
            self.console.print(tone, line);
        }
    }
}
