use std::sync::{Arc, Mutex};
use std::time::Duration;

use kubewizard::console::{BufferConsole, Console, Tone};
use kubewizard::error::ShellError;
use kubewizard::shell::{ExitReason, Flow, FnHandler, Handler, Shell, ShellBuilder};
use tokio::sync::mpsc;

const WARNING: &str = "Press Ctrl+C again to exit";
const UNKNOWN: &str = "Unknown command. Type 'help' for a list of available commands.";

/// Records every raw line it receives.
struct Recorder {
    name: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl Handler for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Record the input."
    }

    async fn invoke(&self, console: &dyn Console, input: &str) -> anyhow::Result<Flow> {
        self.seen.lock().unwrap().push(input.to_string());
        console.print(Tone::Plain, &format!("{} ran", self.name));
        Ok(Flow::Continue)
    }
}

/// Sleeps before printing, so interrupts can land mid-invocation.
struct Slow;

#[async_trait::async_trait]
impl Handler for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Take a while."
    }

    async fn invoke(&self, console: &dyn Console, _input: &str) -> anyhow::Result<Flow> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        console.print(Tone::Plain, "slow done");
        Ok(Flow::Continue)
    }
}

fn builder(console: &Arc<BufferConsole>) -> ShellBuilder {
    Shell::builder("DemoApp", "This is a demo app.")
        .console(console.clone() as Arc<dyn Console>)
        .interrupt_pause(Duration::ZERO)
}

fn recorder(name: &'static str) -> (Recorder, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    (
        Recorder {
            name,
            seen: Arc::clone(&seen),
        },
        seen,
    )
}

fn count(console: &BufferConsole, line: &str) -> usize {
    console.lines().iter().filter(|l| l.as_str() == line).count()
}

// ============================================================
// Lifecycle
// ============================================================

#[tokio::test]
async fn welcome_banner_then_exiting_on_end_of_input() {
    let console = Arc::new(BufferConsole::new());
    let mut shell = builder(&console).build().unwrap();

    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(
        console.lines(),
        vec![
            "🎉 Welcome to DemoApp!",
            "This is a demo app.",
            "Type 'help' to see available commands.",
            "DemoApp",
            "Exiting...",
        ]
    );
    assert_eq!(console.entries().last().unwrap().0, Tone::Error);
}

#[tokio::test]
async fn exit_says_goodbye_and_stops_reading() {
    let console = Arc::new(BufferConsole::with_input(["exit", "help"]));
    let mut shell = builder(&console).build().unwrap();

    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::ExitCommand);
    assert_eq!(console.lines().last().unwrap(), "Goodbye!");
    assert_eq!(count(&console, "Available commands:"), 0);
}

#[tokio::test]
async fn handler_can_end_the_session() {
    let console = Arc::new(BufferConsole::with_input(["quit", "help"]));
    let mut shell = builder(&console)
        .handler(FnHandler::new("quit", "Leave.", |_, _| Ok(Flow::Exit)))
        .build()
        .unwrap();

    assert_eq!(shell.run().await, ExitReason::ExitCommand);
    assert_eq!(count(&console, "Available commands:"), 0);
}

// ============================================================
// Dispatch
// ============================================================

#[tokio::test]
async fn first_token_is_matched_case_insensitively_with_raw_line() {
    let (echo, seen) = recorder("echo");
    let console = Arc::new(BufferConsole::with_input(["  ECHO   Hello World  ", "echo x"]));
    let mut shell = builder(&console).handler(echo).build().unwrap();

    shell.run().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["  ECHO   Hello World  ".to_string(), "echo x".to_string()]
    );
}

#[tokio::test]
async fn unknown_command_without_fallback() {
    let console = Arc::new(BufferConsole::with_input(["frobnicate now"]));
    let mut shell = builder(&console).build().unwrap();

    shell.run().await;

    assert_eq!(count(&console, UNKNOWN), 1);
}

#[tokio::test]
async fn fallback_receives_unmatched_input() {
    let (fallback, seen) = recorder("default");
    let console = Arc::new(BufferConsole::with_input(["why is my nginx pod not ready"]));
    let mut shell = builder(&console).fallback(fallback).build().unwrap();

    shell.run().await;

    assert_eq!(*seen.lock().unwrap(), vec!["why is my nginx pod not ready"]);
    assert_eq!(count(&console, UNKNOWN), 0);
}

#[tokio::test]
async fn blank_input_prints_empty_line() {
    let (fallback, seen) = recorder("default");
    let console = Arc::new(BufferConsole::with_input(["", "   "]));
    let mut shell = builder(&console).fallback(fallback).build().unwrap();

    shell.run().await;

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(count(&console, ""), 2);
}

#[tokio::test]
async fn handler_error_is_rendered_and_loop_continues() {
    let (echo, seen) = recorder("echo");
    let console = Arc::new(BufferConsole::with_input(["boom", "echo after"]));
    let mut shell = builder(&console)
        .handler(FnHandler::new("boom", "Fail.", |_, _| {
            Err(anyhow::anyhow!("kaboom"))
        }))
        .handler(echo)
        .build()
        .unwrap();

    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(count(&console, "Error: kaboom"), 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn clear_builtin_clears_the_console() {
    let console = Arc::new(BufferConsole::with_input(["clear", "CLEAR"]));
    let mut shell = builder(&console).build().unwrap();

    shell.run().await;

    assert_eq!(console.clear_count(), 2);
}

#[tokio::test]
async fn history_records_non_empty_lines() {
    let console = Arc::new(BufferConsole::with_input(["help", "", "nope"]));
    let mut shell = builder(&console).build().unwrap();

    shell.run().await;

    assert_eq!(shell.session().history(), ["help", "nope"]);
}

// ============================================================
// Registration
// ============================================================

#[tokio::test]
async fn user_handler_takes_a_builtin_name() {
    let (clear, seen) = recorder("clear");
    let console = Arc::new(BufferConsole::with_input(["clear"]));
    let mut shell = builder(&console).handler(clear).build().unwrap();

    shell.run().await;

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(console.clear_count(), 0);
    assert_eq!(shell.registry().entries().len(), 3);
}

#[test]
fn duplicate_user_handlers_are_rejected() {
    let (first, _) = recorder("status");
    let (second, _) = recorder("STATUS");
    let result = Shell::builder("DemoApp", "demo")
        .console(Arc::new(BufferConsole::new()))
        .handler(first)
        .handler(second)
        .build();

    assert!(matches!(result, Err(ShellError::DuplicateCommand(name)) if name == "status"));
}

#[test]
fn late_registration_cannot_shadow_builtins() {
    let (help, _) = recorder("help");
    let mut shell = Shell::builder("DemoApp", "demo")
        .console(Arc::new(BufferConsole::new()))
        .build()
        .unwrap();

    assert!(matches!(
        shell.register(Arc::new(help)),
        Err(ShellError::DuplicateCommand(_))
    ));
}

// ============================================================
// Help
// ============================================================

#[tokio::test]
async fn help_lists_commands_aligned_then_fallback() {
    let (status, _) = recorder("status");
    let console = Arc::new(BufferConsole::with_input(["help"]));
    let mut shell = builder(&console).handler(status).build().unwrap();

    shell.run().await;

    let lines = console.lines();
    let start = lines.iter().position(|l| l == "Available commands:").unwrap();
    assert_eq!(
        &lines[start..start + 6],
        [
            "Available commands:",
            "  - status:  Record the input.",
            "  - help  :  Print help info.",
            "  - exit  :  Exit the application.",
            "  - clear :  Clear the screen.",
            "  - *     :  Default handler.",
        ]
    );
}

#[test]
fn help_uses_fallback_description() {
    let (fallback, _) = recorder("default");
    let shell = Shell::builder("DemoApp", "demo")
        .console(Arc::new(BufferConsole::new()))
        .fallback(fallback)
        .build()
        .unwrap();

    assert_eq!(
        shell.help_lines().last().unwrap(),
        "  - *    :  Record the input."
    );
}

// ============================================================
// Interrupts
// ============================================================

#[tokio::test]
async fn two_interrupts_end_the_session() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(()).unwrap();
    tx.send(()).unwrap();
    let console = Arc::new(BufferConsole::with_input(["help"]));
    let mut shell = builder(&console).interrupts(rx).build().unwrap();

    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::Interrupted);
    assert_eq!(count(&console, WARNING), 1);
    assert!(console.entries().contains(&(Tone::Warning, WARNING.to_string())));
    assert_eq!(console.lines().last().unwrap(), "Goodbye!");
    assert_eq!(count(&console, "Available commands:"), 0);
}

#[tokio::test]
async fn dispatch_between_interrupts_resets_the_count() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(()).unwrap();
    let poke_tx = tx.clone();
    let console = Arc::new(BufferConsole::with_input(["poke"]));
    let mut shell = builder(&console)
        .interrupts(rx)
        .handler(FnHandler::new("poke", "Send an interrupt.", move |_, _| {
            poke_tx.send(())?;
            Ok(Flow::Continue)
        }))
        .build()
        .unwrap();

    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(count(&console, WARNING), 2);
    assert_eq!(shell.session().interrupt_count(), 1);
}

#[tokio::test]
async fn single_interrupt_does_not_cancel_a_running_handler() {
    let (tx, rx) = mpsc::unbounded_channel();
    let console = Arc::new(BufferConsole::with_input(["slow"]));
    let mut shell = builder(&console).interrupts(rx).handler(Slow).build().unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(());
    });
    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::EndOfInput);
    let lines = console.lines();
    let warned = lines.iter().position(|l| l == WARNING).unwrap();
    let done = lines.iter().position(|l| l == "slow done").unwrap();
    assert!(warned < done);
}

#[tokio::test]
async fn two_interrupts_during_a_handler_end_the_session() {
    let (tx, rx) = mpsc::unbounded_channel();
    let console = Arc::new(BufferConsole::with_input(["slow", "help"]));
    let mut shell = builder(&console).interrupts(rx).handler(Slow).build().unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(());
        let _ = tx.send(());
    });
    let reason = shell.run().await;

    assert_eq!(reason, ExitReason::Interrupted);
    assert_eq!(count(&console, "slow done"), 0);
    assert_eq!(console.lines().last().unwrap(), "Goodbye!");
}
