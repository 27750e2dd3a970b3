use fluency_rs_config::CompletionDefaults;
use fluency_rs_core::UpstreamProvider;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn UpstreamProvider>,
    pub defaults: Arc<CompletionDefaults>,
}

impl AppState {
    pub fn new(provider: Arc<dyn UpstreamProvider>, defaults: CompletionDefaults) -> Self {
        Self {
            provider,
            defaults: Arc::new(defaults),
        }
    }
}
