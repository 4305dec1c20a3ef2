//! Anthropic Messages API provider.
//!
//! API reference: https://docs.anthropic.com/en/api/messages

use crate::client::{LlmClient, MessageRequest, MessageResponse};
use crate::types::{ContentBlock, StopReason, Usage};
use serde::Deserialize;
use tutor_core::{AppError, AppResult};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default `anthropic-version` header value.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Messages API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

/// Messages API error envelope.
#[derive(Debug, Deserialize)]
struct AnthropicErrorEnvelope {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Anthropic model client.
pub struct AnthropicClient {
    /// Base URL for the API
    base_url: String,

    /// API key sent as `x-api-key`
    api_key: String,

    /// Value of the `anthropic-version` header
    api_version: String,

    /// HTTP client
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the `anthropic-version` header.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Convert a wire response to a `MessageResponse`.
    fn convert_response(response: AnthropicResponse) -> MessageResponse {
        let stop_reason = response
            .stop_reason
            .as_deref()
            .map(StopReason::from_wire)
            .unwrap_or(StopReason::EndTurn);

        MessageResponse {
            content: response.content,
            stop_reason,
            model: response.model,
            usage: response.usage,
        }
    }

    /// Turn an error body into a readable message.
    fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<AnthropicErrorEnvelope>(body) {
            Ok(envelope) => format!(
                "Anthropic API error ({}): {}: {}",
                status, envelope.error.kind, envelope.error.message
            ),
            Err(_) => format!("Anthropic API error ({}): {}", status, body),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn create_message(&self, request: &MessageRequest) -> AppResult<MessageResponse> {
        tracing::info!(
            "Sending message request to Anthropic ({} turns, tools: {})",
            request.messages.len(),
            request.has_tools()
        );
        tracing::debug!("Request: {:?}", request);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::ModelCall(format!("Failed to send request to Anthropic: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ModelCall(Self::describe_error(status, &error_text)));
        }

        let wire: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelCall(format!("Failed to parse Anthropic response: {}", e)))?;

        tracing::info!(
            "Received reply from Anthropic (stop_reason: {:?}, blocks: {})",
            wire.stop_reason,
            wire.content.len()
        );
        tracing::debug!("Response: {:?}", wire);

        Ok(Self::convert_response(wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::with_base_url("sk-test", "http://localhost:8080/");
        assert_eq!(client.provider_name(), "anthropic");
        assert_eq!(client.messages_url(), "http://localhost:8080/v1/messages");
        assert_eq!(client.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_convert_tool_use_response() {
        let wire: AnthropicResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Searching."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_course_content",
                 "input": {"query": "loops", "lesson_number": 3}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 30}
        }))
        .unwrap();

        let response = AnthropicClient::convert_response(wire);
        assert!(response.requests_tools());
        assert_eq!(response.first_text(), Some("Searching."));
        assert_eq!(response.tool_uses()[0].input["lesson_number"], 3);
        assert_eq!(response.usage.input_tokens, 120);
    }

    #[test]
    fn test_convert_response_with_thinking_block() {
        let wire: AnthropicResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "Check the outline first.", "signature": "abc"},
                {"type": "text", "text": "Here is the outline."}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();

        let response = AnthropicClient::convert_response(wire);
        assert!(!response.requests_tools());
        assert_eq!(response.content[0], ContentBlock::Unknown);
        assert_eq!(response.first_text(), Some("Here is the outline."));
    }

    #[test]
    fn test_convert_missing_stop_reason() {
        let wire: AnthropicResponse = serde_json::from_value(json!({"content": []})).unwrap();
        let response = AnthropicClient::convert_response(wire);
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert!(response.content.is_empty());
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let message = AnthropicClient::describe_error(reqwest::StatusCode::from_u16(529).unwrap(), body);
        assert!(message.contains("overloaded_error"));
        assert!(message.contains("Overloaded"));

        let raw = AnthropicClient::describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(raw.contains("upstream down"));
    }
}
