//! Capability client port
//!
//! Defines the interface for generating text from a model vendor. One client
//! per participant; adapters live in the infrastructure layer.

use async_trait::async_trait;
use roundtable_domain::{Participant, Role};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while talking to a model vendor
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Missing credential for provider {0}")]
    MissingCredential(String),

    #[error("Provider {0} requires an explicit endpoint")]
    MissingEndpoint(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported provider kind: {0}")]
    UnsupportedKind(String),
}

/// One entry of the ordered conversation sent to a vendor.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Generation parameters passed through from the session record.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Successful output of one generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    /// Reasoning trace, for vendors that expose one.
    pub reasoning: Option<String>,
    pub tokens_used: Option<u32>,
    pub latency_ms: Option<f64>,
}

/// Generates text for one participant given an ordered conversation.
///
/// This port is how the engine talks to model vendors. Implementations
/// (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CapabilityClient: Send + Sync {
    /// Vendor model identifier this client speaks for.
    fn model(&self) -> &str;

    /// Generate a response to the given conversation.
    async fn generate(
        &self,
        conversation: &[ChatTurn],
        params: &GenerationParams,
    ) -> Result<Generation, CapabilityError>;
}

/// Builds a capability client from a participant's provider configuration.
///
/// Called once per eligible participant at session initialization.
pub trait CapabilityFactory: Send + Sync {
    fn client_for(&self, participant: &Participant)
    -> Result<Arc<dyn CapabilityClient>, CapabilityError>;
}
