//! Bounded multi-round tool-calling loop.
//!
//! Each round sends the full turn sequence to the model. A reply without tool
//! requests ends the query. A reply with tool requests is echoed back as an
//! assistant turn, every request is executed in order, and the results go back
//! as one user turn. When the round limit is reached while the model still
//! wants tools, one final call is made with the schemas withheld.
//!
//! Every path returns text: model failures and aborted rounds map to fixed
//! fallback messages instead of errors.

use crate::rag::tools::ToolExecutor;
use crate::rag::types::{Citation, CitationLog};
use std::sync::Arc;
use tracing::Instrument;
use tutor_core::{AppConfig, AppError, AppResult, ToolFailurePolicy};
use tutor_llm::{ContentBlock, LlmClient, Message, MessageRequest, MessageResponse, ToolSchema};
use tutor_prompt::SystemPrompt;

/// Returned when a reply has no content at all.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I was unable to generate a response. Please try again.";

/// Returned when a reply has content but no text.
pub const INCOMPLETE_RESPONSE_FALLBACK: &str =
    "I was unable to generate a complete response. Please try again.";

/// Returned when a round is aborted and no earlier text exists.
pub const TOOL_FAILURE_FALLBACK: &str =
    "I encountered an error while processing your request. Please try again.";

/// Returned when the model call itself fails.
pub const MODEL_FAILURE_FALLBACK: &str =
    "I'm experiencing technical difficulties. Please try your request again.";

/// Tool result content when no executor was supplied.
pub const NO_EXECUTOR_MESSAGE: &str =
    "Error: Tool execution not available - no tool executor configured";

/// Model and loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub model: String,
    pub max_tool_rounds: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub failure_policy: ToolFailurePolicy,
}

impl OrchestratorSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tool_rounds: 2,
            temperature: 0.0,
            max_tokens: 800,
            failure_policy: ToolFailurePolicy::AbortRound,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tool_rounds: config.assistant.max_tool_rounds,
            temperature: config.assistant.temperature,
            max_tokens: config.assistant.max_tokens,
            failure_policy: config.assistant.tool_failure_policy,
        }
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: ToolFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

/// Per-query conversation state.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub query: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub round: u32,
    pub last_response: Option<MessageResponse>,
}

impl ConversationState {
    pub fn new(query: impl Into<String>, system: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            messages: vec![Message::user(query.clone())],
            query,
            system: system.into(),
            round: 0,
            last_response: None,
        }
    }
}

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub answer: String,
    pub citations: Vec<Citation>,
    /// Rounds that ran with tools attached
    pub rounds: u32,
    pub model_calls: u32,
}

impl Generation {
    fn finish(
        answer: impl Into<String>,
        mut citations: CitationLog,
        state: &ConversationState,
        model_calls: u32,
    ) -> Self {
        Self {
            answer: answer.into(),
            citations: citations.take(),
            rounds: state.round,
            model_calls,
        }
    }
}

/// How a tool round ended.
enum RoundOutcome {
    Committed,
    Aborted(AppError),
}

/// Drives the model through bounded tool-calling rounds.
pub struct ConversationOrchestrator {
    client: Arc<dyn LlmClient>,
    settings: OrchestratorSettings,
    system_prompt: SystemPrompt,
}

impl ConversationOrchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        settings: OrchestratorSettings,
        system_prompt: SystemPrompt,
    ) -> Self {
        Self {
            client,
            settings,
            system_prompt,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Answer a query, letting the model call tools for up to
    /// `max_tool_rounds` rounds.
    ///
    /// Empty `tools` is the same as none. Without an executor, every tool
    /// request gets an error result instead of running.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolSchema]>,
        executor: Option<&dyn ToolExecutor>,
    ) -> Generation {
        let system = match self.system_prompt.render(history) {
            Ok(system) => system,
            Err(e) => {
                tracing::error!("Failed to render system instructions: {}", e);
                let state = ConversationState::new(query, String::new());
                return Generation::finish(
                    MODEL_FAILURE_FALLBACK,
                    CitationLog::new(),
                    &state,
                    0,
                );
            }
        };

        let tools = tools.filter(|t| !t.is_empty());
        let mut state = ConversationState::new(query, system);
        let mut citations = CitationLog::new();
        let mut model_calls: u32 = 0;

        while state.round < self.settings.max_tool_rounds {
            state.round += 1;
            let span = tracing::info_span!("round", n = state.round);

            let response = match self
                .call_model(&state, tools)
                .instrument(span.clone())
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(parent: &span, "Model call failed: {}", e);
                    return Generation::finish(
                        MODEL_FAILURE_FALLBACK,
                        citations,
                        &state,
                        model_calls + 1,
                    );
                }
            };
            model_calls += 1;

            if !response.requests_tools() {
                tracing::info!(parent: &span, "Model answered without tools");
                let answer = reply_text(&response);
                return Generation::finish(answer, citations, &state, model_calls);
            }

            state.messages.push(Message::assistant_blocks(echoed_blocks(&response)));

            let outcome = self
                .run_tools(&response, executor, &mut state, &mut citations)
                .instrument(span.clone())
                .await;
            state.last_response = Some(response);

            if let RoundOutcome::Aborted(e) = outcome {
                tracing::warn!(parent: &span, "Round aborted by tool failure: {}", e);
                // Text from earlier rounds is never reused
                let answer = state
                    .last_response
                    .as_ref()
                    .and_then(MessageResponse::first_text)
                    .unwrap_or(TOOL_FAILURE_FALLBACK)
                    .to_string();
                return Generation::finish(answer, citations, &state, model_calls);
            }
        }

        // Round limit reached: one more call, tools withheld
        let span = tracing::info_span!("final");
        let answer = match self.call_model(&state, None).instrument(span.clone()).await {
            Ok(response) => reply_text(&response),
            Err(e) => {
                tracing::warn!(parent: &span, "Final model call failed: {}", e);
                MODEL_FAILURE_FALLBACK.to_string()
            }
        };
        model_calls += 1;

        Generation::finish(answer, citations, &state, model_calls)
    }

    async fn call_model(
        &self,
        state: &ConversationState,
        tools: Option<&[ToolSchema]>,
    ) -> AppResult<MessageResponse> {
        let mut request = MessageRequest::new(&self.settings.model, state.messages.clone())
            .with_system(&state.system)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(tools) = tools {
            request = request.with_tools(tools);
        }

        tracing::debug!(
            "Calling model (turns: {}, tools: {})",
            request.messages.len(),
            request.has_tools()
        );
        self.client.create_message(&request).await
    }

    /// Execute every tool request of a reply, in order.
    ///
    /// Results and citations are committed to the conversation only when the
    /// whole round succeeds.
    async fn run_tools(
        &self,
        response: &MessageResponse,
        executor: Option<&dyn ToolExecutor>,
        state: &mut ConversationState,
        citations: &mut CitationLog,
    ) -> RoundOutcome {
        let mut results = Vec::new();
        let mut staged = Vec::new();

        for tool_use in response.tool_uses() {
            let Some(executor) = executor else {
                results.push(ContentBlock::tool_error(tool_use.id, NO_EXECUTOR_MESSAGE));
                continue;
            };

            tracing::info!("Executing tool: {}", tool_use.name);
            match executor.execute_tool(tool_use.name, tool_use.input).await {
                Ok(output) => {
                    staged.extend(output.citations);
                    results.push(if output.is_error {
                        ContentBlock::tool_error(tool_use.id, output.content)
                    } else {
                        ContentBlock::tool_result(tool_use.id, output.content)
                    });
                }
                Err(e) if e.is_recoverable_tool_error() => {
                    results.push(ContentBlock::tool_error(tool_use.id, e.to_string()));
                }
                Err(e) => match self.settings.failure_policy {
                    ToolFailurePolicy::AbortRound => return RoundOutcome::Aborted(e),
                    ToolFailurePolicy::BestEffort => {
                        tracing::warn!("Tool {} failed, continuing: {}", tool_use.name, e);
                        results.push(ContentBlock::tool_error(
                            tool_use.id,
                            format!("Tool execution failed: {}", e),
                        ));
                    }
                },
            }
        }

        if !results.is_empty() {
            state.messages.push(Message::tool_results(results));
        }
        citations.extend(staged);
        RoundOutcome::Committed
    }
}

/// First text segment of a reply, or the matching fallback.
fn reply_text(response: &MessageResponse) -> String {
    if response.content.is_empty() {
        return EMPTY_RESPONSE_FALLBACK.to_string();
    }
    response
        .first_text()
        .map(str::to_string)
        .unwrap_or_else(|| INCOMPLETE_RESPONSE_FALLBACK.to_string())
}

/// Blocks replayed as the assistant turn. Unmodelled blocks are dropped.
fn echoed_blocks(response: &MessageResponse) -> Vec<ContentBlock> {
    response
        .content
        .iter()
        .filter(|block| !matches!(block, ContentBlock::Unknown))
        .cloned()
        .collect()
}
