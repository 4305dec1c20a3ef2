//! Model integration crate for the Tutor assistant.
//!
//! This crate provides a provider-agnostic abstraction over a text-generation
//! service that can request tool invocations. Conversations are sequences of
//! role-tagged turns whose content is text or typed blocks.
//!
//! # Providers
//! - **Anthropic**: Messages API (default)
//!
//! # Example
//! ```no_run
//! use tutor_llm::{LlmClient, Message, MessageRequest, providers::AnthropicClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AnthropicClient::new("sk-...");
//! let request = MessageRequest::new("claude-sonnet-4-20250514", vec![Message::user("Hello")]);
//! let response = client.create_message(&request).await?;
//! println!("{}", response.first_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, MessageRequest, MessageResponse};
pub use factory::{create_client, create_client_from_config};
pub use providers::AnthropicClient;
pub use types::{
    ContentBlock, Message, MessageContent, Role, StopReason, ToolChoice, ToolSchema, ToolUse, Usage,
};
