//! Model provider factory.
//!
//! Creates a model client from the configured provider name, injecting the
//! resolved API key and optional endpoint override.

use crate::client::LlmClient;
use crate::providers::AnthropicClient;
use std::sync::Arc;
use tutor_core::{AppConfig, AppError, AppResult};

/// Create a model client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("anthropic" or its alias "claude")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key; required by every supported provider
///
/// # Errors
/// Returns error if the provider is unknown or the API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    build_client(provider, endpoint, api_key, None)
}

/// Create the client for the configured provider.
///
/// Endpoint and API version come from the provider's config block; the key is
/// resolved through [`AppConfig::resolve_api_key`].
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider_config = config.get_provider_config(&config.provider);
    let api_key = config.resolve_api_key(&config.provider);

    build_client(
        &config.provider,
        provider_config.and_then(|pc| pc.endpoint.as_deref()),
        api_key.as_deref(),
        provider_config.and_then(|pc| pc.api_version.as_deref()),
    )
    .map_err(AppError::Config)
}

fn build_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    api_version: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "claude" | "anthropic" => {
            let api_key = match api_key {
                Some(key) if !key.trim().is_empty() => key,
                _ => return Err("Anthropic provider requires API key".to_string()),
            };
            let mut client = match endpoint {
                Some(base_url) => AnthropicClient::with_base_url(api_key, base_url),
                None => AnthropicClient::new(api_key),
            };
            if let Some(version) = api_version {
                client = client.with_api_version(version);
            }
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
