//! Generic chat-completions client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format; the vendor
//! is selected purely by endpoint. DeepSeek's `reasoning_content` extension
//! is surfaced as the generation's reasoning trace when present.

use super::{api_error, map_request_error};
use async_trait::async_trait;
use roundtable_application::{
    CapabilityClient, CapabilityError, ChatTurn, Generation, GenerationParams,
};
use roundtable_domain::Role;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// OpenAI-compatible chat-completions client, parameterized by endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    /// `api_base` is the versioned API root, e.g. `https://api.openai.com/v1`.
    pub fn new(http: reqwest::Client, api_base: String, api_key: String, model: String) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            model,
        }
    }

    fn build_request(&self, conversation: &[ChatTurn], params: &GenerationParams) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: conversation
                .iter()
                .map(|turn| WireMessage {
                    role: role_tag(turn.role),
                    content: turn.content.clone(),
                })
                .collect(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

fn role_tag(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl CapabilityClient for ChatCompletionsClient {
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
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::MalformedResponse("no choices in response".into()))?;

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(model = %self.model, latency_ms, "chat completion received");

        Ok(Generation {
            text: choice.message.content.unwrap_or_default(),
            reasoning: choice.message.reasoning_content,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
            latency_ms: Some(latency_ms),
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    /// DeepSeek reasoning extension; absent on most vendors.
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::new(
            reqwest::Client::new(),
            "https://api.deepseek.com/v1/".into(),
            "sk-test".into(),
            "deepseek-chat".into(),
        )
    }

    #[test]
    fn test_endpoint_join_strips_trailing_slash() {
        assert_eq!(
            client().endpoint,
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_shape_matches_wire_format() {
        let conversation = vec![
            ChatTurn::system("You are Alpha."),
            ChatTurn::assistant("[Beta]: hello"),
            ChatTurn::user("Focus on costs."),
        ];
        let params = GenerationParams {
            temperature: 0.5,
            max_tokens: 512,
        };
        let request = client().build_request(&conversation, &params);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["max_tokens"], 512);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert_eq!(value["messages"][1]["content"], "[Beta]: hello");
        assert_eq!(value["messages"][2]["role"], "user");
    }

    #[test]
    fn test_response_parse_with_reasoning_and_usage() {
        let body = r#"{
            "choices": [{
                "message": {
                    "content": "I agree with Beta.",
                    "reasoning_content": "Beta's point holds."
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 80, "completion_tokens": 20, "total_tokens": 100}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let choice = &parsed.choices[0];
        assert_eq!(choice.message.content.as_deref(), Some("I agree with Beta."));
        assert_eq!(
            choice.message.reasoning_content.as_deref(),
            Some("Beta's point holds.")
        );
        assert_eq!(parsed.usage.unwrap().total_tokens, 100);
    }

    #[test]
    fn test_response_parse_without_optional_fields() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.usage.is_none());
        assert!(parsed.choices[0].message.reasoning_content.is_none());
    }
}
