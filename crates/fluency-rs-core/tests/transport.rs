//! HTTP transport tests against a local stub server.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use fluency_rs_core::{
    CompletionParams, CompletionTransport, DirectTransport, GenerationError, OpenAiProvider,
    ProxyTransport, UpstreamError, UpstreamProvider,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

fn params() -> CompletionParams {
    CompletionParams {
        model: "gpt-4o-mini".to_string(),
        max_tokens: 2000,
        temperature: 0.7,
    }
}

async fn capture(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    captured.lock().push((auth, body));
    Json(json!({
        "choices": [{ "text": "\n{\"ok\":true}\n" }],
        "usage": { "total_tokens": 42 }
    }))
}

/// The provider client posts the OpenAI completions body with a bearer key.
#[tokio::test]
async fn provider_sends_completion_request() {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(
        Router::new()
            .route("/v1/completions", post(capture))
            .with_state(captured.clone()),
    )
    .await;

    let provider = OpenAiProvider::new(base, Some("sk-test".to_string()));
    let completion = provider.complete("hello", &params()).await.expect("complete");
    assert_eq!(completion.text, "{\"ok\":true}");
    assert_eq!(completion.usage, json!({ "total_tokens": 42 }));

    let calls = captured.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_deref(), Some("Bearer sk-test"));
    assert_eq!(calls[0].1["prompt"], "hello");
    assert_eq!(calls[0].1["model"], "gpt-4o-mini");
    assert_eq!(calls[0].1["max_tokens"], 2000);
}

/// Provider error bodies are relayed by message.
#[tokio::test]
async fn provider_error_message_is_relayed() {
    let base = spawn(Router::new().route(
        "/v1/completions",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Incorrect API key provided" } })),
            )
        }),
    ))
    .await;

    let transport = DirectTransport::new(base, Some("sk-bad".to_string())).expect("transport");
    let err = transport.complete("hello", &params()).await.unwrap_err();
    match err {
        GenerationError::Upstream { status, message } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

/// A provider error without a JSON body falls back to the status text.
#[tokio::test]
async fn provider_error_without_body_uses_status() {
    let base = spawn(Router::new().route(
        "/v1/completions",
        post(|| async { StatusCode::BAD_GATEWAY }),
    ))
    .await;
    let provider = OpenAiProvider::new(base, None);
    let err = provider.complete("hello", &params()).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status: 502, .. }));
    assert_eq!(err.to_string(), "Bad Gateway");
}

/// The proxy transport reads `completion` and forwards every parameter.
#[tokio::test]
async fn proxy_transport_reads_completion() {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let base = spawn(
        Router::new()
            .route(
                "/api/openai",
                post(
                    |State(captured): State<Captured>, Json(body): Json<Value>| async move {
                        captured.lock().push((None, body));
                        Json(json!({ "completion": "generated", "usage": {} }))
                    },
                ),
            )
            .with_state(captured.clone()),
    )
    .await;

    let transport = ProxyTransport::new(base);
    let text = transport.complete("prompt", &params()).await.expect("complete");
    assert_eq!(text, "generated");
    let body = captured.lock()[0].1.clone();
    assert_eq!(body["prompt"], "prompt");
    assert_eq!(body["max_tokens"], 2000);
    assert_eq!(body["model"], "gpt-4o-mini");
}

/// Non-success proxy replies carry the server's error field or a status message.
#[tokio::test]
async fn proxy_transport_error_messages() {
    let base = spawn(
        Router::new()
            .route(
                "/api/openai",
                post(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "model overloaded" })),
                    )
                }),
            )
            .route("/plain/api/openai", post(|| async { StatusCode::NOT_FOUND })),
    )
    .await;

    let err = ProxyTransport::new(base.clone())
        .complete("prompt", &params())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "model overloaded");

    let err = ProxyTransport::new(format!("{base}/plain"))
        .complete("prompt", &params())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server responded with status 404");
}
