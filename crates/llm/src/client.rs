//! Model client abstraction and request/response types.
//!
//! This module defines the core abstraction for calling an external
//! text-generation service that can request tool invocations.

use crate::types::{ContentBlock, Message, StopReason, ToolChoice, ToolSchema, ToolUse, Usage};
use serde::Serialize;
use tutor_core::AppResult;

/// A single model call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRequest {
    /// Model identifier
    pub model: String,

    /// System instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Ordered turn sequence
    pub messages: Vec<Message>,

    /// Capability schemas the model may request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,

    /// Tool selection policy; present exactly when tools are
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl MessageRequest {
    /// Create a new request with required fields.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            tools: None,
            tool_choice: None,
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Set the system instructions.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Attach capability schemas with an automatic tool-choice policy.
    ///
    /// An empty list attaches nothing.
    pub fn with_tools(mut self, tools: &[ToolSchema]) -> Self {
        if tools.is_empty() {
            self.tools = None;
            self.tool_choice = None;
        } else {
            self.tools = Some(tools.to_vec());
            self.tool_choice = Some(ToolChoice::Auto);
        }
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// True when capability schemas are attached.
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageResponse {
    /// Ordered content segments
    pub content: Vec<ContentBlock>,

    /// Why generation stopped
    pub stop_reason: StopReason,

    /// Model that generated the reply
    pub model: String,

    /// Usage statistics
    pub usage: Usage,
}

impl MessageResponse {
    /// Build a reply from blocks, mostly for tests and doubles.
    pub fn new(content: Vec<ContentBlock>, stop_reason: StopReason) -> Self {
        Self {
            content,
            stop_reason,
            model: String::new(),
            usage: Usage::default(),
        }
    }

    /// A plain-text reply that ends the turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentBlock::text(text)], StopReason::EndTurn)
    }

    /// First textual segment, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentBlock::as_text)
    }

    /// All tool requests, in the order the model gave them.
    pub fn tool_uses(&self) -> Vec<ToolUse<'_>> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolUse { id, name, input }),
                _ => None,
            })
            .collect()
    }

    /// True when the model stopped to request at least one tool.
    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
            && self
                .content
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Trait for model providers.
///
/// This trait abstracts the underlying provider and exposes one blocking-style
/// call per round: send the full turn sequence, receive one reply.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;

    /// Perform one model call.
    ///
    /// # Errors
    /// Returns `AppError::ModelCall` on transport or service failure.
    async fn create_message(&self, request: &MessageRequest) -> AppResult<MessageResponse>;
}
