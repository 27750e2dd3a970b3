//! Public SDK surface for Fluency.
//!
//! This crate re-exports the building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use fluency_rs_config as config;
pub use fluency_rs_core as core;
/// Re-export for convenience.
pub use fluency_rs_protocol as protocol;
pub use fluency_rs_server as server;
/// Re-export for convenience.
pub use fluency_rs_store as store;

pub use fluency_rs_config::FluencyConfig;
pub use fluency_rs_core::{GenerationError, Orchestrator};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Honors `RUST_LOG` and stamps lines with millisecond timestamps. This is a
/// no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
