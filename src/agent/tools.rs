//! Tool schema definitions and dispatch for the agent loop.
//!
//! Defines the five tools the model may call as [`genai::chat::Tool`]
//! schemas and routes tool calls to their implementations.
//!
//! Tool errors are always returned as structured JSON strings (never panics or
//! `Err` variants) so the model can observe the error and react.

use genai::chat::{Tool, ToolCall};
use serde_json::json;

use super::{web_fetch, web_search};
use crate::console::{ask, Console, Tone};
use crate::safety::SafetyLayer;

pub const KUBE_TOOL: &str = "kube_tool";
pub const KUBE_TOOL_WITH_APPROVE: &str = "kube_tool_with_approve";
pub const HUMAN_INPUT: &str = "human_input";
pub const WEB_SEARCH: &str = "web_search";
pub const REQUESTS_GET: &str = "requests_get";

const HUMAN_PROMPT: &str = "📝";

/// What the tools need at dispatch time.
pub struct ToolContext {
    pub safety: SafetyLayer,
    pub search_max_results: usize,
}

fn commands_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "commands": {
                "type": "string",
                "description": "The kubectl/helm related command to run, e.g. `kubectl get pods`."
            }
        },
        "required": ["commands"]
    })
}

fn single_string_schema(field: &str, description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            field: {
                "type": "string",
                "description": description
            }
        },
        "required": [field]
    })
}

/// Define the tool schemas offered to the model, in a fixed order.
pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool::new(KUBE_TOOL)
            .with_description(
                "Tool to run k8s related commands (kubectl, helm) on the Kubernetes cluster. \
                 Use it only for read-only commands. The input is the string command to run.",
            )
            .with_schema(commands_schema()),
        Tool::new(KUBE_TOOL_WITH_APPROVE)
            .with_description(
                "Tool to run k8s related commands with an approval check. If the command \
                 will modify resources (delete, patch, create, update and so on) or view \
                 credential info (secrets), it MUST go through this tool. The input is \
                 the raw string of the command.",
            )
            .with_schema(commands_schema()),
        Tool::new(HUMAN_INPUT)
            .with_description(
                "Ask for human help only when needed, try to do as little as possible.",
            )
            .with_schema(single_string_schema(
                "query",
                "The question to show the human",
            )),
        Tool::new(WEB_SEARCH)
            .with_description(
                "Search the web for information on a topic. Useful sources for k8s info: \
                 https://kubernetes.io/docs/ (official documentation) and \
                 https://github.com/kubernetes/kubernetes (source and issues).",
            )
            .with_schema(single_string_schema("query", "The search query")),
        Tool::new(REQUESTS_GET)
            .with_description(
                "A portal to the internet. Use this when you need to get specific content \
                 from a website. Input should be a url (i.e. https://kubernetes.io/releases). \
                 The output will be the text content of the page.",
            )
            .with_schema(single_string_schema("url", "The URL to fetch")),
    ]
}

/// Return a human-readable description of all available tools for the
/// system prompt.
pub fn tool_descriptions() -> String {
    "\
### kube_tool
Run a read-only kubectl or helm command without asking the user.
- **commands** (string, required): the command to run
- Returns: the command output, or a JSON error object
- Commands on the deny list are refused

### kube_tool_with_approve
Run a kubectl or helm command after the user approves it.
- **commands** (string, required): the command to run
- Returns: the command output, or a refusal message if the user declines
- Required for anything that modifies resources or reveals secrets

### human_input
Ask the user a question and return the answer.
- **query** (string, required): the question

### web_search
Search the web with DuckDuckGo.
- **query** (string, required): the search query
- Returns: JSON array of results with title, url and snippet

### requests_get
Fetch a web page.
- **url** (string, required): the URL
- Returns: the page as markdown (truncated)"
        .to_string()
}

/// Dispatch a tool call to its implementation.
///
/// Always returns a `String`: the tool output, or a JSON error object
/// `{"error": "..."}`. Unknown tool names are reported the same way.
pub async fn dispatch_tool_call(call: &ToolCall, ctx: &ToolContext, console: &dyn Console) -> String {
    match call.fn_name.as_str() {
        KUBE_TOOL => dispatch_kube(call, ctx, None).await,
        KUBE_TOOL_WITH_APPROVE => dispatch_kube(call, ctx, Some(console)).await,
        HUMAN_INPUT => dispatch_human_input(call, console).await,
        WEB_SEARCH => match string_arg(call, "query") {
            Ok(query) => web_search::search(query, ctx.search_max_results).await,
            Err(e) => e,
        },
        REQUESTS_GET => match string_arg(call, "url") {
            Ok(url) => web_fetch::fetch_url(url, Some(web_fetch::MAX_FETCH_CHARS)).await,
            Err(e) => e,
        },
        unknown => json!({"error": format!("Unknown tool: {unknown}")}).to_string(),
    }
}

fn string_arg<'a>(call: &'a ToolCall, field: &str) -> Result<&'a str, String> {
    call.fn_arguments
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            json!({"error": format!("{}: missing or invalid '{field}' argument", call.fn_name)})
                .to_string()
        })
}

/// Run a cluster command, through the approval gate when a console is given.
async fn dispatch_kube(call: &ToolCall, ctx: &ToolContext, approver: Option<&dyn Console>) -> String {
    let command = match string_arg(call, "commands") {
        Ok(command) => command,
        Err(e) => return e,
    };

    let result = match approver {
        Some(console) => ctx.safety.execute_gated(command, console).await,
        None => ctx.safety.execute(command).await,
    };

    match result {
        Ok(output) => output,
        Err(e) => json!({"error": format!("{} failed: {e}", call.fn_name)}).to_string(),
    }
}

async fn dispatch_human_input(call: &ToolCall, console: &dyn Console) -> String {
    let query = match string_arg(call, "query") {
        Ok(query) => query,
        Err(e) => return e,
    };

    console.print(Tone::Accent, query);
    match ask(console, HUMAN_PROMPT).await {
        Ok(Some(answer)) => answer,
        Ok(None) => json!({"error": "human_input: no answer, input closed"}).to_string(),
        Err(e) => json!({"error": format!("human_input: {e}")}).to_string(),
    }
}
