//! KubeWizard's shell: the agent behind the fallback, plus `clear` and
//! `history` commands that act on the agent's memory.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::agent::KubeAgent;
use crate::console::{Console, Tone};
use crate::error::ShellError;
use crate::shell::{Flow, Handler, Shell};

pub const APP_NAME: &str = "KubeWizard";
pub const APP_DESCRIPTION: &str =
    "This an AI agent for kubernetes, it can troubling shooting, deploy, and manage kubernetes.";

const EMPTY_HISTORY: &str = "No chat history yet.";

/// The agent, shared between the handlers that use it.
pub type SharedAgent = Arc<Mutex<KubeAgent>>;

/// Clears the screen and forgets the conversation.
pub struct ClearHandler {
    agent: SharedAgent,
}

#[async_trait::async_trait]
impl Handler for ClearHandler {
    fn name(&self) -> &str {
        "clear"
    }

    fn description(&self) -> &str {
        "Clear the chat history."
    }

    async fn invoke(&self, console: &dyn Console, _input: &str) -> anyhow::Result<Flow> {
        console.clear();
        self.agent.lock().await.clear_memory();
        Ok(Flow::Continue)
    }
}

pub struct HistoryHandler {
    agent: SharedAgent,
}

#[async_trait::async_trait]
impl Handler for HistoryHandler {
    fn name(&self) -> &str {
        "history"
    }

    fn description(&self) -> &str {
        "Display the chat history."
    }

    async fn invoke(&self, console: &dyn Console, _input: &str) -> anyhow::Result<Flow> {
        let lines = self.agent.lock().await.history_lines();
        if lines.is_empty() {
            console.print(Tone::Info, EMPTY_HISTORY);
        }
        for line in &lines {
            console.print(Tone::Plain, line);
        }
        Ok(Flow::Continue)
    }
}

/// Forwards anything that is not a command to the agent and prints the
/// answer.
pub struct AgentHandler {
    agent: SharedAgent,
}

#[async_trait::async_trait]
impl Handler for AgentHandler {
    fn name(&self) -> &str {
        "default"
    }

    fn description(&self) -> &str {
        "Ask me everything about your kubernetes cluster(why my nginx pod not ready)"
    }

    async fn invoke(&self, console: &dyn Console, input: &str) -> anyhow::Result<Flow> {
        let answer = self.agent.lock().await.invoke(console, input.trim()).await?;
        console.print(Tone::Success, &answer);
        Ok(Flow::Continue)
    }
}

/// Assemble the KubeWizard shell around a shared agent.
pub fn build_shell(
    agent: SharedAgent,
    console: Arc<dyn Console>,
    interrupts: Option<mpsc::UnboundedReceiver<()>>,
) -> Result<Shell, ShellError> {
    let mut builder = Shell::builder(APP_NAME, APP_DESCRIPTION)
        .console(console)
        .handler(ClearHandler {
            agent: Arc::clone(&agent),
        })
        .handler(HistoryHandler {
            agent: Arc::clone(&agent),
        })
        .fallback(AgentHandler { agent });

    if let Some(interrupts) = interrupts {
        builder = builder.interrupts(interrupts);
    }
    builder.build()
}
