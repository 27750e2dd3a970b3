//! Client for the provider's text-completions API.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Provider endpoint path appended to the configured base URL.
pub const COMPLETIONS_PATH: &str = "/v1/completions";

/// Fully resolved parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Generated text plus the provider's usage accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Value,
}

/// Errors from a single provider call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Request never produced a response.
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// Success status but no usable completion in the body.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(err) => err.status().map(|status| status.as_u16()),
            Self::Status { status, .. } => Some(*status),
            Self::Malformed(_) => None,
        }
    }
}

/// A completions backend. The proxy endpoint and the direct transport both
/// call through this trait so tests can substitute a stub.
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, UpstreamError>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// `reqwest` client for an OpenAI-compatible completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_PATH)
    }
}

#[async_trait]
impl UpstreamProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, UpstreamError> {
        let body = CompletionBody {
            model: &params.model,
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        debug!(
            "calling completions endpoint (model={}, max_tokens={}, prompt_len={})",
            params.model,
            params.max_tokens,
            prompt.len()
        );
        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error occurred")
                        .to_string()
                });
            warn!(
                "completions endpoint failed (status={}, message={})",
                status.as_u16(),
                message
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        completion_from_payload(&payload)
    }
}

/// Pull `choices[0].text` and `usage` out of a provider body.
pub fn completion_from_payload(payload: &Value) -> Result<Completion, UpstreamError> {
    let text = payload
        .pointer("/choices/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| UpstreamError::Malformed("missing choices[0].text".to_string()))?;
    Ok(Completion {
        text: text.trim().to_string(),
        usage: payload.get("usage").cloned().unwrap_or(Value::Null),
    })
}
