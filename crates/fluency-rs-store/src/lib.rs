//! Persistence for Fluency: tests, attempts, the request quota record, and
//! the in-memory cache of generated tests.

pub mod cache;
pub mod error;
pub mod memory;
pub mod provider;
pub mod quota;

/// Store error type.
pub use error::StoreError;
/// Generated-test cache.
pub use cache::{CacheKey, MemoryTestCache, TestCache};
/// In-memory test store.
pub use memory::InMemoryTestStore;
/// Test store interface and default file implementation.
pub use provider::{FileTestStore, TestFilter, TestStore};
/// Request quota record and stores.
pub use quota::{
    FileQuotaStore, MemoryQuotaStore, QuotaDecision, QuotaPolicy, QuotaStore, RateLimitRecord,
    apply_quota,
};
