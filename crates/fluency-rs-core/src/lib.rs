//! Core generation logic for Fluency.
//!
//! This crate owns the provider client, the proxy/direct transport strategy,
//! the request quota, prompt building, response parsing, scoring, and the
//! orchestrator that ties them to the stores.

pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod rate_limit;
pub mod scoring;
pub mod transport;
pub mod upstream;

pub use error::GenerationError;
/// Orchestrator facade and store wiring.
pub use orchestrator::{Orchestrator, StoreBundle, build_default_stores};
pub use rate_limit::RateLimiter;
pub use scoring::{Score, score_answers};
/// Transport strategy and its implementations.
pub use transport::{CompletionTransport, DirectTransport, ProxyTransport, build_transport};
/// Provider client.
pub use upstream::{Completion, CompletionParams, OpenAiProvider, UpstreamError, UpstreamProvider};
