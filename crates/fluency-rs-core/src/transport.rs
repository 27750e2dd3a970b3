//! Completion transports used by the orchestrator.
//!
//! Generation code only sees [`CompletionTransport`]. Which implementation is
//! used (the proxy endpoint or the provider directly) is decided once, when the
//! transport is built from config.

use crate::error::GenerationError;
use crate::upstream::{CompletionParams, OpenAiProvider, UpstreamProvider};
use async_trait::async_trait;
use fluency_rs_config::{GenerationConfig, TransportMode};
use fluency_rs_protocol::{ErrorBody, PROXY_ROUTE, ProxyRequest};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Sends a prompt and returns the generated text.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, GenerationError>;
}

/// Calls the completion proxy endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct ProxyTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), PROXY_ROUTE)
    }
}

#[async_trait]
impl CompletionTransport for ProxyTransport {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, GenerationError> {
        let body = ProxyRequest {
            prompt: Some(prompt.to_string()),
            model: Some(params.model.clone()),
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
        };
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::Upstream {
                status: None,
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Server responded with status {}", status.as_u16()));
            warn!(
                "proxy call failed (status={}, message={})",
                status.as_u16(),
                message
            );
            return Err(GenerationError::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| GenerationError::Upstream {
                status: Some(status.as_u16()),
                message: err.to_string(),
            })?;
        Ok(proxy_text(&payload))
    }
}

/// Generated text from a proxy reply: `text`, then `completion`, else empty.
fn proxy_text(payload: &Value) -> String {
    ["text", "completion"]
        .iter()
        .filter_map(|key| payload.get(key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Calls the provider directly with a client-held key.
#[derive(Clone)]
pub struct DirectTransport {
    provider: Arc<dyn UpstreamProvider>,
}

impl DirectTransport {
    /// Build a direct transport; a missing or blank key is a config error.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Config("provider API key is not configured".to_string())
            })?;
        Ok(Self::with_provider(Arc::new(OpenAiProvider::new(
            base_url,
            Some(api_key),
        ))))
    }

    pub fn with_provider(provider: Arc<dyn UpstreamProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionTransport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, GenerationError> {
        let completion = self.provider.complete(prompt, params).await?;
        debug!("direct completion received (len={})", completion.text.len());
        Ok(completion.text)
    }
}

/// Build the transport selected by `generation.transport`.
pub fn build_transport(
    config: &GenerationConfig,
) -> Result<Arc<dyn CompletionTransport>, GenerationError> {
    let transport: Arc<dyn CompletionTransport> = match config.transport {
        TransportMode::Proxy => Arc::new(ProxyTransport::new(config.proxy_url.clone())),
        TransportMode::Direct => Arc::new(DirectTransport::new(
            config.upstream_base_url.clone(),
            config.api_key.clone(),
        )?),
    };
    info!("completion transport ready (transport={})", transport.name());
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn proxy_text_prefers_text_then_completion() {
        assert_eq!(proxy_text(&json!({ "text": "a", "completion": "b" })), "a");
        assert_eq!(proxy_text(&json!({ "text": "", "completion": "b" })), "b");
        assert_eq!(proxy_text(&json!({ "completion": "b" })), "b");
        assert_eq!(proxy_text(&json!({ "usage": {} })), "");
    }

    #[test]
    fn direct_transport_requires_key() {
        let mut config = GenerationConfig {
            transport: TransportMode::Direct,
            ..GenerationConfig::default()
        };
        let err = build_transport(&config).err().expect("missing key");
        assert!(matches!(err, GenerationError::Config(_)));

        config.api_key = Some("   ".to_string());
        assert!(build_transport(&config).is_err());

        config.api_key = Some("sk-test".to_string());
        let transport = build_transport(&config).expect("transport");
        assert_eq!(transport.name(), "direct");
    }

    #[test]
    fn proxy_is_the_default_transport() {
        let transport = build_transport(&GenerationConfig::default()).expect("transport");
        assert_eq!(transport.name(), "proxy");
        let proxy = ProxyTransport::new("http://localhost:3001/");
        assert_eq!(proxy.endpoint(), "http://localhost:3001/api/openai");
    }
}
