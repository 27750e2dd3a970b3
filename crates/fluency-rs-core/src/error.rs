//! Error types for test generation and attempt handling.

use crate::upstream::UpstreamError;
use chrono::{DateTime, Utc};
use fluency_rs_store::StoreError;
use thiserror::Error;

/// Errors returned by the orchestrator and its transports.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Required input was missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),
    /// Request quota is used up for the current window.
    #[error("rate limit reached, try again after {reset_time}")]
    QuotaExceeded { reset_time: DateTime<Utc> },
    /// Proxy or provider call failed; `message` is relayed verbatim.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// Generated text was not a test in the expected JSON shape.
    #[error("failed to generate a valid test format: {0}")]
    Parse(String),
    /// Referenced test or attempt does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Transport could not be built from config.
    #[error("config error: {0}")]
    Config(String),
}

impl From<UpstreamError> for GenerationError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream {
            status: err.status(),
            message: err.to_string(),
        }
    }
}
