use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use fluency_rs_core::CompletionParams;
use fluency_rs_protocol::{HealthStatus, PROXY_ROUTE, ProxyRequest, ProxyResponse};
use log::{debug, error, warn};

/// Body of `GET /`.
pub const ROOT_MESSAGE: &str = "OpenAI Proxy API is running";

/// Build the proxy router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(PROXY_ROUTE, post(complete))
        .with_state(state)
}

async fn root() -> &'static str {
    ROOT_MESSAGE
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

async fn complete(
    State(state): State<AppState>,
    body: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Json<ProxyResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("rejected proxy body (error={})", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;
    let prompt = request
        .prompt
        .filter(|prompt| !prompt.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Prompt is required"))?;

    let params = CompletionParams {
        model: request
            .model
            .unwrap_or_else(|| state.defaults.model.clone()),
        max_tokens: request.max_tokens.unwrap_or(state.defaults.max_tokens),
        temperature: request.temperature.unwrap_or(state.defaults.temperature),
    };
    debug!(
        "proxying completion (model={}, max_tokens={}, temperature={})",
        params.model, params.max_tokens, params.temperature
    );

    match state.provider.complete(&prompt, &params).await {
        Ok(completion) => Ok(Json(ProxyResponse {
            completion: completion.text,
            usage: completion.usage,
        })),
        Err(err) => {
            error!("upstream completion failed (error={err})");
            Err(ApiError::upstream(err.to_string()))
        }
    }
}
