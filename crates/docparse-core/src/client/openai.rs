//! Client for OpenAI-compatible chat completion APIs.
//!
//! Requests run in JSON mode (`response_format: json_object`). Page images
//! are sent as `data:` URLs in multimodal messages.

use crate::client::{CompletionRequest, ModelClient};
use crate::config::OpenAiSettings;
use crate::error::{DocParseError, ModelClientError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, DocParseError> {
        settings.validate()?;
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| DocParseError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(OpenAiClient {
            http,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            request_timeout: settings.request_timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelClientError> {
        let body = build_chat_request(request);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelClientError::Timeout(self.request_timeout)
                } else {
                    ModelClientError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response
            .text()
            .await
            .map_err(|e| ModelClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ModelClientError::from_status(
                status.as_u16(),
                retry_after,
                error_message(&text),
            ));
        }

        extract_content(&text)
    }

    fn backend_name(&self) -> &str {
        "openai"
    }
}

fn build_chat_request(request: &CompletionRequest) -> ChatRequest<'_> {
    let user_content = if request.images.is_empty() {
        MessageContent::Text(&request.user)
    } else {
        let mut parts = vec![ContentPart::Text {
            text: &request.user,
        }];
        parts.extend(request.images.iter().map(|png| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/png;base64,{}", png),
                detail: "high",
            },
        }));
        MessageContent::Parts(parts)
    };

    ChatRequest {
        model: &request.model,
        messages: vec![
            Message {
                role: "system",
                content: MessageContent::Text(&request.system),
            },
            Message {
                role: "user",
                content: user_content,
            },
        ],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        response_format: ResponseFormat {
            format_type: "json_object",
        },
    }
}

/// Pull the first choice's text out of a chat completion body.
fn extract_content(body: &str) -> Result<String, ModelClientError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelClientError::InvalidReply(format!("undecodable response: {}", e)))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ModelClientError::InvalidReply("no content in response".into()))
}

/// Prefer the API's `error.message`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(500).collect())
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| *s >= 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
}
