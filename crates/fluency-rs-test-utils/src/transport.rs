use async_trait::async_trait;
use fluency_rs_core::{CompletionParams, CompletionTransport, GenerationError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Transport replaying queued responses and recording every prompt.
///
/// Once the queue is down to its last response, that response is repeated.
#[derive(Debug)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, CompletionParams)>>,
}

impl RecordingTransport {
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_responses([response.into()])
    }

    pub fn with_responses(responses: impl IntoIterator<Item = String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion calls received.
    pub fn invocations(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn params(&self) -> Vec<CompletionParams> {
        self.prompts
            .lock()
            .iter()
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .push((prompt.to_string(), params.clone()));
        let mut responses = self.responses.lock();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        Ok(response.unwrap_or_default())
    }
}

/// Transport failing every call with an upstream error.
#[derive(Debug, Default)]
pub struct FailingTransport {
    calls: Mutex<usize>,
}

impl FailingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl CompletionTransport for FailingTransport {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _params: &CompletionParams,
    ) -> Result<String, GenerationError> {
        *self.calls.lock() += 1;
        Err(GenerationError::Upstream {
            status: Some(500),
            message: "upstream unavailable".to_string(),
        })
    }
}
