//! Anthropic messages-API client.
//!
//! The wire format differs from chat-completions: the system instruction is
//! a top-level field, and the message list must alternate user/assistant
//! roles starting with a user turn. Consecutive same-role turns are merged
//! and an opening user turn is synthesized for the first turn of a session,
//! when no discussion history exists yet.

use super::{api_error, map_request_error};
use async_trait::async_trait;
use roundtable_application::{
    CapabilityClient, CapabilityError, ChatTurn, Generation, GenerationParams,
};
use roundtable_domain::Role;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Text sent as the opening user turn when the transcript is still empty.
const OPENING_TURN: &str = "Please begin the discussion.";

pub struct AnthropicClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(
        http: reqwest::Client,
        api_base: Option<String>,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            http,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }

    fn build_request(&self, conversation: &[ChatTurn], params: &GenerationParams) -> MessagesRequest {
        let system: Vec<&str> = conversation
            .iter()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str())
            .collect();

        let mut messages: Vec<WireMessage> = Vec::new();
        for turn in conversation.iter().filter(|t| t.role != Role::System) {
            let role = match turn.role {
                Role::Assistant => "assistant",
                _ => "user",
            };
            // The API rejects consecutive same-role messages
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&turn.content);
                }
                _ => messages.push(WireMessage {
                    role,
                    content: turn.content.clone(),
                }),
            }
        }
        if messages.is_empty() {
            messages.push(WireMessage {
                role: "user",
                content: OPENING_TURN.to_string(),
            });
        }

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages,
        }
    }
}

#[async_trait]
impl CapabilityClient for AnthropicClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        conversation: &[ChatTurn],
        params: &GenerationParams,
    ) -> Result<Generation, CapabilityError> {
        let request = self.build_request(conversation, params);
        let started = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CapabilityError::Connection(e.to_string()))?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;

        let mut text_parts = Vec::new();
        let mut thinking_parts = Vec::new();
        for block in parsed.content {
            match block.kind.as_str() {
                "text" => text_parts.extend(block.text),
                "thinking" => thinking_parts.extend(block.thinking),
                _ => {}
            }
        }
        if text_parts.is_empty() {
            return Err(CapabilityError::MalformedResponse(
                "no text content in response".into(),
            ));
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(model = %self.model, latency_ms, "anthropic message received");

        Ok(Generation {
            text: text_parts.join(""),
            reasoning: if thinking_parts.is_empty() {
                None
            } else {
                Some(thinking_parts.join("\n"))
            },
            tokens_used: Some(parsed.usage.input_tokens + parsed.usage.output_tokens),
            latency_ms: Some(latency_ms),
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
