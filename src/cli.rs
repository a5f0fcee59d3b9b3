use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ApprovalMode;

#[derive(Parser, Debug)]
#[command(
    name = "kubewizard",
    version,
    about = "AI assistant for troubleshooting and managing Kubernetes clusters",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat options when no subcommand is given
    #[command(flatten)]
    pub chat: ChatArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive assistant (default)
    Chat(ChatArgs),
    /// Run a single kubectl/helm command through the approval gate
    Exec {
        /// The command to run, e.g. `kubectl get pods -n web`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ChatArgs {
    /// Model name (e.g., "gpt-4o-mini", "llama3.2")
    #[arg(short, long)]
    pub model: Option<String>,

    /// 0 = answers only, 1 = show tool calls, 2 = also show tool results
    #[arg(short, long)]
    pub debug_level: Option<u8>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct CommonArgs {
    /// Path to config file (overrides ./kubewizard.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Cluster command timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// How gated commands are approved
    #[arg(long, value_enum)]
    pub approval: Option<ApprovalMode>,

    /// Approve every command without asking (same as --approval auto)
    #[arg(short, long)]
    pub yes: bool,
}

impl Cli {
    /// Chat options in effect, or `None` when running `exec`.
    pub fn chat_args(&self) -> Option<&ChatArgs> {
        match &self.command {
            Some(Commands::Chat(args)) => Some(args),
            Some(Commands::Exec { .. }) => None,
            None => Some(&self.chat),
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Some(Commands::Chat(args)) => &args.common,
            Some(Commands::Exec { common, .. }) => common,
            None => &self.chat.common,
        }
    }
}
