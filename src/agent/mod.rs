//! The reasoning agent behind the shell's fallback handler.
//!
//! [`KubeAgent`] runs a tool-calling conversation loop over a genai chat
//! client. Cluster commands go through the [`SafetyLayer`](crate::safety::SafetyLayer);
//! the remaining tools ask the human, search the web, or fetch a page.

pub mod kube_agent;
pub mod logging;
pub mod system_prompt;
pub mod tools;
pub mod web_fetch;
pub mod web_search;

pub use kube_agent::{KubeAgent, ITERATION_LIMIT_MESSAGE};
pub use tools::{define_tools, dispatch_tool_call, ToolContext};
