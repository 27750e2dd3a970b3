//! Error types for store operations.

use fluency_rs_protocol::{AttemptId, TestId};

/// Errors returned by test, attempt, and quota stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Referenced test does not exist.
    #[error("test not found: {0}")]
    TestNotFound(TestId),
    /// Referenced attempt does not exist.
    #[error("attempt not found: {0}")]
    AttemptNotFound(AttemptId),
    /// Attempt was already submitted.
    #[error("attempt already completed: {0}")]
    AttemptCompleted(AttemptId),
}
