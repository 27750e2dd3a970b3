//! HTTP proxy forwarding completion requests to the language-model provider.
//!
//! Routes:
//! - `POST /api/openai`: resolve defaults, call the provider once, relay the result
//! - `GET /`: plain-text liveness message
//! - `GET /health`: JSON liveness status

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{ROOT_MESSAGE, router};
pub use state::AppState;

use anyhow::Context;
use axum::http::HeaderValue;
use fluency_rs_config::ProxyConfig;
use fluency_rs_core::OpenAiProvider;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// CORS layer for the configured origin; unset or `*` allows any origin.
pub fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin.map(str::trim) {
        None | Some("") | Some("*") => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("invalid allowed origin: {origin}"))?;
            Ok(layer.allow_origin(origin))
        }
    }
}

/// Bind the proxy and serve until ctrl-c.
pub async fn serve(config: &ProxyConfig) -> anyhow::Result<()> {
    if config.api_key.is_none() {
        warn!("no provider api key configured; upstream calls will be rejected");
    }
    let provider = Arc::new(OpenAiProvider::new(
        config.upstream_base_url.clone(),
        config.api_key.clone(),
    ));
    let state = AppState::new(provider, config.defaults.clone());
    let app = router(state).layer(cors_layer(config.allowed_origin.as_deref())?);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "proxy listening (addr={}, upstream={})",
        addr, config.upstream_base_url
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("proxy server failed")?;
    info!("proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::cors_layer;

    #[test]
    fn cors_accepts_wildcard_and_exact_origins() {
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("*")).is_ok());
        assert!(cors_layer(Some("https://app.example")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
