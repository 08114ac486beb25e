//! Google Gemini generateContent client.
//!
//! Gemini's wire format names roles `user`/`model`, carries the system
//! instruction in a dedicated field, and nests text under content parts.

use super::{api_error, map_request_error};
use async_trait::async_trait;
use roundtable_application::{
    CapabilityClient, CapabilityError, ChatTurn, Generation, GenerationParams,
};
use roundtable_domain::Role;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text sent as the opening user turn when the transcript is still empty.
const OPENING_TURN: &str = "Please begin the discussion.";

pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
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
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(&self, conversation: &[ChatTurn], params: &GenerationParams) -> GenerateRequest {
        let system: Vec<&str> = conversation
            .iter()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str())
            .collect();

        let mut contents: Vec<Content> = conversation
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|turn| Content {
                role: match turn.role {
                    Role::Assistant => "model",
                    _ => "user",
                },
                parts: vec![Part::new(turn.content.clone())],
            })
            .collect();
        if contents.is_empty() {
            contents.push(Content {
                role: "user",
                parts: vec![Part::new(OPENING_TURN.to_string())],
            });
        }

        GenerateRequest {
            system_instruction: if system.is_empty() {
                None
            } else {
                Some(SystemInstruction {
                    parts: vec![Part::new(system.join("\n\n"))],
                })
            },
            contents,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        }
    }
}

#[async_trait]
impl CapabilityClient for GeminiClient {
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
            .header("x-goog-api-key", &self.api_key)
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

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::MalformedResponse("no candidates in response".into()))?;
        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(CapabilityError::MalformedResponse(
                "no text content in candidate".into(),
            ));
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(model = %self.model, latency_ms, "gemini response received");

        Ok(Generation {
            text,
            reasoning: None,
            tokens_used: parsed.usage_metadata.map(|u| u.total_token_count),
            latency_ms: Some(latency_ms),
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl Part {
    fn new(text: String) -> Self {
        Self { text: Some(text) }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: u32,
}
