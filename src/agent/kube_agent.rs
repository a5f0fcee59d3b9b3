//! The tool-calling conversation loop.
//!
//! Each [`KubeAgent::invoke`] builds a request from the system prompt, the
//! conversation memory and the new question, then alternates between model
//! calls and tool dispatch until the model answers without calling a tool or
//! the iteration limit is reached. Only the question and the final answer
//! are kept in memory; tool traffic lives for a single invocation.

use std::path::Path;

use futures::StreamExt;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatRole, ChatStreamEvent, ToolCall, ToolResponse,
};
use genai::Client;

use super::logging::{now_iso, LogEntry, SessionLogger};
use super::system_prompt::build_system_prompt;
use super::tools::{define_tools, dispatch_tool_call, tool_descriptions, ToolContext};
use crate::config::{AppConfig, Verbosity};
use crate::console::{Console, Tone};
use crate::error::AgentError;
use crate::safety::SafetyLayer;

/// Answer returned when the model is still calling tools after the last
/// allowed iteration.
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

const TOOL_ARGS_PREVIEW: usize = 200;
const OBSERVATION_PREVIEW: usize = 1_000;

/// One model turn: optional text plus any tool calls.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Something that can answer a chat request.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, AgentError>;
}

/// [`ChatModel`] backed by a genai client. The provider is picked from the
/// model name; credentials come from the provider's usual environment
/// variables (e.g. `OPENAI_API_KEY`).
pub struct GenaiModel {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl GenaiModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            options: ChatOptions::default()
                .with_capture_content(true)
                .with_capture_tool_calls(true),
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for GenaiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, AgentError> {
        let stream_res = self
            .client
            .exec_chat_stream(&self.model, request.clone(), Some(&self.options))
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        let mut stream = stream_res.stream;
        let mut completion = None;
        let mut last_error = None;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::End(end)) => {
                    completion = Some(Completion {
                        text: end.captured_first_text().map(|t| t.to_string()),
                        tool_calls: end
                            .captured_tool_calls()
                            .map(|calls| calls.into_iter().cloned().collect())
                            .unwrap_or_default(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    // The End event may still arrive.
                    tracing::warn!("LLM stream error: {}", e);
                    last_error = Some(e.to_string());
                }
            }
        }

        completion.ok_or_else(|| {
            AgentError::LlmError(match last_error {
                Some(e) => format!("stream ended without a response: {e}"),
                None => "stream ended without a response".to_string(),
            })
        })
    }
}

/// Kubernetes troubleshooting agent with conversation memory.
pub struct KubeAgent {
    model: Box<dyn ChatModel>,
    system_prompt: String,
    tools: ToolContext,
    verbosity: Verbosity,
    max_iterations: usize,
    memory: Vec<ChatMessage>,
    logger: Option<SessionLogger>,
    turn: u64,
}

impl KubeAgent {
    /// Build the agent from configuration, using a genai-backed model.
    ///
    /// A session log that cannot be created is reported and skipped; it
    /// never prevents the agent from starting.
    pub async fn new(config: &AppConfig, safety: SafetyLayer) -> Self {
        let model = Box::new(GenaiModel::new(config.model.clone()));
        let system_prompt =
            build_system_prompt(&config.working_dir, &config.model, &tool_descriptions()).await;

        let logger = if config.session_logs {
            match start_session_log(&config.log_dir, &config.model, &config.working_dir) {
                Ok(logger) => Some(logger),
                Err(e) => {
                    tracing::warn!("Session logging disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::with_model(model, system_prompt, config, safety).with_logger(logger)
    }

    /// Build the agent around an explicit model and system prompt.
    pub fn with_model(
        model: Box<dyn ChatModel>,
        system_prompt: String,
        config: &AppConfig,
        safety: SafetyLayer,
    ) -> Self {
        Self {
            model,
            system_prompt,
            tools: ToolContext {
                safety,
                search_max_results: config.search_max_results,
            },
            verbosity: config.verbosity,
            max_iterations: config.max_iterations,
            memory: Vec::new(),
            logger: None,
            turn: 0,
        }
    }

    pub fn with_logger(mut self, logger: Option<SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Answer one question, calling tools as the model requests.
    ///
    /// Tool failures are fed back to the model as text; only a failing
    /// model call is an error. On error the memory is left unchanged.
    pub async fn invoke(&mut self, console: &dyn Console, input: &str) -> Result<String, AgentError> {
        self.turn += 1;
        let turn = self.turn;
        self.log(LogEntry::UserInput {
            timestamp: now_iso(),
            turn,
            content: input.to_string(),
        });

        let mut chat_req = ChatRequest::from_system(&self.system_prompt).with_tools(define_tools());
        for msg in &self.memory {
            chat_req = chat_req.append_message(msg.clone());
        }
        chat_req = chat_req.append_message(ChatMessage::user(input));

        let mut answer = None;
        for iteration in 1..=self.max_iterations {
            tracing::debug!(turn, iteration, "Calling model");
            let completion = match self.model.complete(&chat_req).await {
                Ok(completion) => completion,
                Err(e) => {
                    self.log(LogEntry::Error {
                        timestamp: now_iso(),
                        turn,
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            };

            if completion.tool_calls.is_empty() {
                match completion.text {
                    Some(text) if !text.trim().is_empty() => {
                        answer = Some(text);
                        break;
                    }
                    _ => {
                        let e = AgentError::LlmError(format!(
                            "{} returned an empty response",
                            self.model.name()
                        ));
                        self.log(LogEntry::Error {
                            timestamp: now_iso(),
                            turn,
                            message: e.to_string(),
                        });
                        return Err(e);
                    }
                }
            }

            if let Some(text) = &completion.text {
                self.log(LogEntry::AssistantText {
                    timestamp: now_iso(),
                    turn,
                    content: text.clone(),
                });
                if self.verbosity >= Verbosity::VerboseWithSteps {
                    console.print(Tone::Plain, text);
                }
            }

            chat_req = chat_req.append_message(ChatMessage::from(completion.tool_calls.clone()));

            for call in &completion.tool_calls {
                self.log(LogEntry::ToolCall {
                    timestamp: now_iso(),
                    turn,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    fn_arguments: call.fn_arguments.clone(),
                });
                if self.verbosity >= Verbosity::Verbose {
                    console.print(
                        Tone::Info,
                        &format!(
                            "> {}: {}",
                            call.fn_name,
                            preview(&tool_args_display(call), TOOL_ARGS_PREVIEW)
                        ),
                    );
                }

                let result = dispatch_tool_call(call, &self.tools, console).await;

                if self.verbosity >= Verbosity::VerboseWithSteps {
                    console.print(Tone::Plain, &preview(&result, OBSERVATION_PREVIEW));
                }
                self.log(LogEntry::ToolResult {
                    timestamp: now_iso(),
                    turn,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    result: result.clone(),
                });

                chat_req = chat_req.append_message(ToolResponse::new(call.call_id.clone(), result));
            }
        }

        let answer = answer.unwrap_or_else(|| {
            tracing::warn!(turn, limit = self.max_iterations, "Iteration limit reached");
            ITERATION_LIMIT_MESSAGE.to_string()
        });

        self.memory.push(ChatMessage::user(input));
        self.memory.push(ChatMessage::assistant(answer.clone()));
        self.log(LogEntry::Answer {
            timestamp: now_iso(),
            turn,
            content: answer.clone(),
        });

        Ok(answer)
    }

    /// The remembered conversation: alternating questions and answers.
    pub fn chat_messages(&self) -> &[ChatMessage] {
        &self.memory
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Render the memory as `Human: ...` / `AI: ...` lines.
    pub fn history_lines(&self) -> Vec<String> {
        self.memory
            .iter()
            .map(|msg| {
                let speaker = match msg.role {
                    ChatRole::User => "Human".to_string(),
                    ChatRole::Assistant => "AI".to_string(),
                    ref other => format!("{other:?}"),
                };
                format!("{speaker}: {}", msg.content.first_text().unwrap_or(""))
            })
            .collect()
    }

    pub fn turns(&self) -> u64 {
        self.turn
    }

    /// Record the end of the session in the log.
    pub fn finish(&mut self, reason: &str) {
        let turns = self.turn;
        if let Some(logger) = &mut self.logger {
            if let Err(e) = logger.log_session_end(turns, reason) {
                tracing::warn!("{}", e);
            }
        }
    }

    fn log(&mut self, entry: LogEntry) {
        if let Some(logger) = &mut self.logger {
            if let Err(e) = logger.log_event(&entry) {
                tracing::warn!("{}", e);
            }
        }
    }
}

fn start_session_log(
    log_dir: &Path,
    model: &str,
    working_dir: &Path,
) -> Result<SessionLogger, AgentError> {
    let mut logger = SessionLogger::new(log_dir)?;
    logger.log_session_start(model, working_dir)?;
    tracing::info!("Session log: {}", logger.log_path().display());
    Ok(logger)
}

/// The command for cluster tools, the compact JSON arguments otherwise.
fn tool_args_display(call: &ToolCall) -> String {
    match call.fn_arguments.get("commands").and_then(|v| v.as_str()) {
        Some(command) => command.to_string(),
        None => call.fn_arguments.to_string(),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
