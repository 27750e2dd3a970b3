//! Test helpers shared across Fluency crates.

pub mod fixtures;
pub mod transport;
pub mod upstream;

pub use fixtures::{generated_test_json, sample_questions, sample_test};
pub use transport::{FailingTransport, RecordingTransport};
pub use upstream::{FailingProvider, FixedProvider};
