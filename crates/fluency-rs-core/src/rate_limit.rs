//! Request quota enforcement in front of every completion call.

use crate::error::GenerationError;
use chrono::{DateTime, Utc};
use fluency_rs_config::QuotaConfig;
use fluency_rs_store::{QuotaDecision, QuotaPolicy, QuotaStore};
use log::{debug, warn};
use std::sync::Arc;

/// Counts requests against a [`QuotaStore`] and refuses them past the ceiling.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    policy: QuotaPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    pub fn from_config(store: Arc<dyn QuotaStore>, config: &QuotaConfig) -> Self {
        Self::new(
            store,
            QuotaPolicy::from_hours(config.max_requests, config.window_hours),
        )
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Count one request at `now`; returns the number still allowed in the window.
    pub fn acquire(&self, now: DateTime<Utc>) -> Result<u32, GenerationError> {
        match self.store.increment_with_reset(now, &self.policy)? {
            QuotaDecision::Allowed {
                remaining,
                reset_time,
            } => {
                debug!("quota acquired (remaining={remaining}, reset_time={reset_time})");
                Ok(remaining)
            }
            QuotaDecision::Exhausted { reset_time } => {
                warn!("quota exhausted (reset_time={reset_time})");
                Err(GenerationError::QuotaExceeded { reset_time })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fluency_rs_store::MemoryQuotaStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn refusal_names_the_reset_time() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryQuotaStore::new()),
            QuotaPolicy::from_hours(1, 24),
        );
        let now = Utc::now();
        assert_eq!(limiter.acquire(now).expect("first"), 0);
        match limiter.acquire(now) {
            Err(GenerationError::QuotaExceeded { reset_time }) => {
                assert_eq!(reset_time, now + Duration::hours(24));
            }
            other => panic!("expected quota error, got {other:?}"),
        }
        assert!(limiter.acquire(now + Duration::hours(25)).is_ok());
    }
}
