//! Capability client adapters.
//!
//! One implementation per transport shape: a generic chat-completions client
//! parameterized by endpoint (OpenAI, DeepSeek, Kimi, Qwen, Zhipu, and any
//! `custom` vendor with an explicit endpoint), plus dedicated clients for the
//! Anthropic and Gemini wire formats. [`ProviderFactory`] routes a
//! participant's configuration to the right client.

pub mod anthropic;
pub mod chat_completions;
pub mod gemini;

pub use anthropic::AnthropicClient;
pub use chat_completions::ChatCompletionsClient;
pub use gemini::GeminiClient;

use roundtable_application::{CapabilityClient, CapabilityError, CapabilityFactory};
use roundtable_domain::{Participant, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout shared by every provider client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds capability clients from participant provider configurations.
///
/// All clients share one HTTP connection pool.
pub struct ProviderFactory {
    http: reqwest::Client,
}

impl ProviderFactory {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityFactory for ProviderFactory {
    fn client_for(
        &self,
        participant: &Participant,
    ) -> Result<Arc<dyn CapabilityClient>, CapabilityError> {
        let config = &participant.provider;
        if config.api_key.is_empty() {
            return Err(CapabilityError::MissingCredential(config.kind.to_string()));
        }

        match &config.kind {
            ProviderKind::Anthropic => Ok(Arc::new(AnthropicClient::new(
                self.http.clone(),
                config.api_base.clone(),
                config.api_key.clone(),
                config.model.clone(),
            ))),
            ProviderKind::Gemini => Ok(Arc::new(GeminiClient::new(
                self.http.clone(),
                config.api_base.clone(),
                config.api_key.clone(),
                config.model.clone(),
            ))),
            kind => {
                let api_base = config
                    .api_base
                    .clone()
                    .or_else(|| kind.default_api_base().map(String::from))
                    .ok_or_else(|| CapabilityError::MissingEndpoint(kind.to_string()))?;
                Ok(Arc::new(ChatCompletionsClient::new(
                    self.http.clone(),
                    api_base,
                    config.api_key.clone(),
                    config.model.clone(),
                )))
            }
        }
    }
}

/// Map a reqwest transport error to the port error taxonomy.
pub(crate) fn map_request_error(err: reqwest::Error) -> CapabilityError {
    if err.is_timeout() {
        CapabilityError::Timeout
    } else {
        CapabilityError::Connection(err.to_string())
    }
}

/// Collapse a non-success HTTP response into an API error, preferring the
/// vendor's structured error message when the body parses.
pub(crate) fn api_error(status: u16, body: &str) -> CapabilityError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect());
    CapabilityError::Api { status, message }
}
