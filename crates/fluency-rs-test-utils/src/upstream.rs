use async_trait::async_trait;
use fluency_rs_core::{Completion, CompletionParams, UpstreamError, UpstreamProvider};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Provider returning the same completion for every prompt.
#[derive(Debug)]
pub struct FixedProvider {
    text: String,
    usage: Value,
    calls: Mutex<Vec<(String, CompletionParams)>>,
}

impl FixedProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: json!({ "prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8 }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_usage(mut self, usage: Value) -> Self {
        self.usage = usage;
        self
    }

    /// Prompts and parameters received so far.
    pub fn calls(&self) -> Vec<(String, CompletionParams)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl UpstreamProvider for FixedProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, UpstreamError> {
        self.calls.lock().push((prompt.to_string(), params.clone()));
        Ok(Completion {
            text: self.text.clone(),
            usage: self.usage.clone(),
        })
    }
}

/// Provider failing every call with a fixed status and message.
#[derive(Debug, Clone)]
pub struct FailingProvider {
    status: u16,
    message: String,
}

impl FailingProvider {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[async_trait]
impl UpstreamProvider for FailingProvider {
    async fn complete(
        &self,
        _prompt: &str,
        _params: &CompletionParams,
    ) -> Result<Completion, UpstreamError> {
        Err(UpstreamError::Status {
            status: self.status,
            message: self.message.clone(),
        })
    }
}
