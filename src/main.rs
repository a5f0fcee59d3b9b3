use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use kubewizard::agent::KubeAgent;
use kubewizard::app;
use kubewizard::cli::{Cli, Commands};
use kubewizard::config::{self, AppConfig};
use kubewizard::console::{Console, TerminalConsole, Tone};
use kubewizard::safety::SafetyLayer;
use kubewizard::shell::{spawn_ctrl_c_listener, ExitReason};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env is the common case.
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never interleave with the console.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    tracing::info!(
        model = %config.model,
        approval = ?config.approval,
        working_dir = %config.working_dir.display(),
        "Config loaded"
    );

    match &cli.command {
        Some(Commands::Exec { command, .. }) => run_exec(&config, &command.join(" ")).await,
        Some(Commands::Chat(_)) | None => {
            run_chat(&config).await?;
            // The stdin reader thread would otherwise keep the runtime alive.
            std::process::exit(0)
        }
    }
}

async fn run_chat(config: &AppConfig) -> anyhow::Result<()> {
    let safety = SafetyLayer::new(config)?;
    tracing::info!(
        blocklist_patterns = safety.blocked_pattern_count(),
        timeout_secs = safety.executor().timeout_secs(),
        "Safety layer initialized"
    );

    let agent = Arc::new(Mutex::new(KubeAgent::new(config, safety).await));
    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new());
    let mut shell = app::build_shell(Arc::clone(&agent), console, Some(spawn_ctrl_c_listener()))?;

    let reason = shell.run().await;
    agent.lock().await.finish(match reason {
        ExitReason::EndOfInput => "end_of_input",
        ExitReason::ExitCommand => "exit_command",
        ExitReason::Interrupted => "interrupted",
    });
    Ok(())
}

async fn run_exec(config: &AppConfig, command: &str) -> anyhow::Result<ExitCode> {
    let safety = SafetyLayer::new(config)?;
    let console = TerminalConsole::new();

    match safety.execute_gated(command, &console).await {
        Ok(output) => {
            print!("{output}");
            if !output.is_empty() && !output.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            console.print(Tone::Error, &e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}
