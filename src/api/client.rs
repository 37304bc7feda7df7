//! Single-shot client for the Responses completion endpoint.
//!
//! One request per call, no retries. Failures are classified into
//! [`ApiError`] so the conversation store can show a readable message.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{InputMessage, ResponsesRequest, ResponsesResponse};
use crate::core::message::Role;
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    Transport(String),
    /// The server answered with a non-success status.
    Status {
        status: u16,
        summary: Option<String>,
    },
    /// The body was not a completion or carried no text.
    UnexpectedResponse,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(detail) => write!(f, "Could not reach the server: {detail}"),
            ApiError::Status {
                status,
                summary: Some(summary),
            } => write!(f, "API Error {status}: {summary}"),
            ApiError::Status {
                status,
                summary: None,
            } => write!(f, "API Error {status}"),
            ApiError::UnexpectedResponse => {
                f.write_str("Received an unexpected response from the server.")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// A previous turn handed to the endpoint alongside the new prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, history: &[HistoryTurn]) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct ResponsesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    generation: GenerationConfig,
}

impl ResponsesClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, generation: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            generation,
        }
    }

    pub fn model(&self) -> &str {
        &self.generation.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, prompt: &str, history: &[HistoryTurn]) -> ResponsesRequest {
        let mut input: Vec<InputMessage> = history
            .iter()
            .map(|turn| InputMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            })
            .collect();
        input.push(InputMessage {
            role: Role::User.as_str().to_string(),
            content: prompt.to_string(),
        });

        ResponsesRequest {
            model: self.generation.model.clone(),
            input,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            max_output_tokens: self.generation.max_output_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for ResponsesClient {
    async fn complete(&self, prompt: &str, history: &[HistoryTurn]) -> Result<String, ApiError> {
        let request = self.build_request(prompt, history);
        let url = construct_api_url(&self.base_url, "responses");

        tracing::debug!(%url, model = %request.model, turns = request.input.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "completion request failed");
            return Err(status_error(status, &body));
        }

        let parsed: ResponsesResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("completion body did not parse: {e}");
            ApiError::UnexpectedResponse
        })?;

        let text = parsed.text().ok_or(ApiError::UnexpectedResponse)?;
        tracing::debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    let summary = serde_json::from_str::<serde_json::Value>(body.trim())
        .ok()
        .and_then(|value| extract_error_summary(&value));
    ApiError::Status {
        status: status.as_u16(),
        summary,
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
