//! Per-shell session state and the interrupt notification channel.

use tokio::sync::mpsc;

/// Interrupts needed, without intervening activity, to terminate the shell.
pub const INTERRUPTS_TO_EXIT: u32 = 2;

/// What the shell should do in response to an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First interrupt: warn and keep running.
    Warn,
    /// Second consecutive interrupt: say goodbye and stop.
    Terminate,
}

/// Mutable state owned by a running shell.
#[derive(Debug, Default)]
pub struct SessionState {
    interrupts: u32,
    history: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an interrupt and decide how to react.
    pub fn record_interrupt(&mut self) -> InterruptAction {
        self.interrupts += 1;
        if self.interrupts >= INTERRUPTS_TO_EXIT {
            InterruptAction::Terminate
        } else {
            InterruptAction::Warn
        }
    }

    /// Any successful dispatch clears pending interrupts.
    pub fn reset_interrupts(&mut self) {
        self.interrupts = 0;
    }

    pub fn interrupt_count(&self) -> u32 {
        self.interrupts
    }

    pub fn push_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Forward Ctrl-C presses from the OS into a channel the shell polls.
///
/// The listener task lives for the rest of the process. Installing the
/// handler replaces the default SIGINT termination.
pub fn spawn_ctrl_c_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}
