//! Request quota record and its stores.
//!
//! The quota is a single `{count, reset_time}` record. Every generation call
//! goes through [`QuotaStore::increment_with_reset`], which resets an expired
//! window, then either counts the request or refuses it.

use crate::error::StoreError;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File holding the persisted quota record.
const RATE_LIMIT_FILE: &str = "rate_limit.json";

/// Persisted request counter for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Empty record whose window starts at `now`.
    pub fn fresh(now: DateTime<Utc>, policy: &QuotaPolicy) -> Self {
        Self {
            count: 0,
            reset_time: now + policy.window,
        }
    }
}

/// Ceiling and window length for the request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl QuotaPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn from_hours(max_requests: u32, window_hours: u32) -> Self {
        Self::new(max_requests, Duration::hours(i64::from(window_hours)))
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::from_hours(50, 24)
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Request counted; `remaining` more fit in this window.
    Allowed {
        remaining: u32,
        reset_time: DateTime<Utc>,
    },
    /// Ceiling reached until `reset_time`.
    Exhausted { reset_time: DateTime<Utc> },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn reset_time(&self) -> DateTime<Utc> {
        match self {
            Self::Allowed { reset_time, .. } | Self::Exhausted { reset_time } => *reset_time,
        }
    }
}

/// Apply one request to `record`, returning the record to persist and the decision.
///
/// A missing record counts as an empty window starting at `now`. An expired
/// window is reset before the request is counted.
pub fn apply_quota(
    record: Option<RateLimitRecord>,
    now: DateTime<Utc>,
    policy: &QuotaPolicy,
) -> (RateLimitRecord, QuotaDecision) {
    let mut record = record.unwrap_or_else(|| RateLimitRecord::fresh(now, policy));
    if now > record.reset_time {
        record = RateLimitRecord::fresh(now, policy);
    }
    if record.count < policy.max_requests {
        record.count += 1;
        let decision = QuotaDecision::Allowed {
            remaining: policy.max_requests - record.count,
            reset_time: record.reset_time,
        };
        (record, decision)
    } else {
        let decision = QuotaDecision::Exhausted {
            reset_time: record.reset_time,
        };
        (record, decision)
    }
}

/// Storage for the quota record.
pub trait QuotaStore: Send + Sync {
    fn get(&self) -> Result<Option<RateLimitRecord>, StoreError>;

    fn set(&self, record: RateLimitRecord) -> Result<(), StoreError>;

    /// Count one request against the quota.
    ///
    /// The default is a plain read-modify-write; implementations override it
    /// to hold a lock across both halves.
    fn increment_with_reset(
        &self,
        now: DateTime<Utc>,
        policy: &QuotaPolicy,
    ) -> Result<QuotaDecision, StoreError> {
        let (record, decision) = apply_quota(self.get()?, now, policy);
        self.set(record)?;
        Ok(decision)
    }
}

/// Process-local quota record.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    record: Mutex<Option<RateLimitRecord>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn get(&self) -> Result<Option<RateLimitRecord>, StoreError> {
        Ok(*self.record.lock())
    }

    fn set(&self, record: RateLimitRecord) -> Result<(), StoreError> {
        *self.record.lock() = Some(record);
        Ok(())
    }

    fn increment_with_reset(
        &self,
        now: DateTime<Utc>,
        policy: &QuotaPolicy,
    ) -> Result<QuotaDecision, StoreError> {
        let mut slot = self.record.lock();
        let (record, decision) = apply_quota(*slot, now, policy);
        *slot = Some(record);
        Ok(decision)
    }
}

/// Quota record persisted as `rate_limit.json` under a root directory.
#[derive(Debug)]
pub struct FileQuotaStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileQuotaStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        Ok(Self {
            path: root.join(RATE_LIMIT_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<Option<RateLimitRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn write_record(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec(record)?)?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

impl QuotaStore for FileQuotaStore {
    fn get(&self) -> Result<Option<RateLimitRecord>, StoreError> {
        let _guard = self.lock.lock();
        self.read_record()
    }

    fn set(&self, record: RateLimitRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        self.write_record(&record)
    }

    fn increment_with_reset(
        &self,
        now: DateTime<Utc>,
        policy: &QuotaPolicy,
    ) -> Result<QuotaDecision, StoreError> {
        let _guard = self.lock.lock();
        let (record, decision) = apply_quota(self.read_record()?, now, policy);
        self.write_record(&record)?;
        debug!(
            "quota updated (count={}, reset_time={})",
            record.count, record.reset_time
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn fifty_requests_fit_and_the_next_is_refused() {
        let store = MemoryQuotaStore::new();
        let policy = QuotaPolicy::default();
        for call in 1..=50 {
            let decision = store
                .increment_with_reset(now(), &policy)
                .expect("quota");
            assert!(decision.is_allowed(), "call {call} should be allowed");
        }
        let refused = store.increment_with_reset(now(), &policy).expect("quota");
        assert_eq!(
            refused,
            QuotaDecision::Exhausted {
                reset_time: now() + Duration::hours(24)
            }
        );
        assert_eq!(store.get().expect("get").map(|record| record.count), Some(50));
    }

    #[test]
    fn expired_window_resets_and_counts_the_request() {
        let store = MemoryQuotaStore::new();
        let policy = QuotaPolicy::from_hours(2, 24);
        store.increment_with_reset(now(), &policy).expect("first");
        store.increment_with_reset(now(), &policy).expect("second");
        assert!(
            !store
                .increment_with_reset(now(), &policy)
                .expect("third")
                .is_allowed()
        );

        let later = now() + Duration::hours(25);
        let decision = store.increment_with_reset(later, &policy).expect("later");
        assert_eq!(
            decision,
            QuotaDecision::Allowed {
                remaining: 1,
                reset_time: later + Duration::hours(24)
            }
        );
    }

    #[test]
    fn refusal_does_not_advance_the_count() {
        let policy = QuotaPolicy::from_hours(1, 1);
        let full = RateLimitRecord {
            count: 1,
            reset_time: now() + Duration::minutes(30),
        };
        let (record, decision) = apply_quota(Some(full), now(), &policy);
        assert_eq!(record, full);
        assert!(!decision.is_allowed());
    }

    #[test]
    fn file_store_persists_between_instances() {
        let temp = TempDir::new().expect("tmp");
        let policy = QuotaPolicy::from_hours(3, 24);
        {
            let store = FileQuotaStore::new(temp.path()).expect("store");
            assert_eq!(store.get().expect("get"), None);
            store.increment_with_reset(now(), &policy).expect("first");
            store.increment_with_reset(now(), &policy).expect("second");
        }
        let store = FileQuotaStore::new(temp.path()).expect("store");
        let decision = store.increment_with_reset(now(), &policy).expect("third");
        assert_eq!(
            decision,
            QuotaDecision::Allowed {
                remaining: 0,
                reset_time: now() + Duration::hours(24)
            }
        );
        assert_eq!(store.get().expect("get").map(|record| record.count), Some(3));
    }
}
