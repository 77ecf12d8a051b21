//! Tests for the OpenAI Responses client against an in-process stub server.
//!
//! Each test binds a throwaway axum server on `127.0.0.1:0` that replays
//! scripted responses and records what it was sent.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use planner_core::llm::{CompletionService, LlmError, OpenAiClient, OpenAiConfig};
use planner_core::plan::{PlanError, PlanOptions, build_request, create_plan};
use planner_core::Horizon;

// -----------------------------------------------------------------------
// Stub server
// -----------------------------------------------------------------------

#[derive(Clone, Default)]
struct Stub {
    replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Stub {
    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last(&self) -> (Option<String>, Value) {
        self.seen.lock().unwrap().last().cloned().expect("stub saw no requests")
    }
}

async fn handle(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    stub.seen.lock().unwrap().push((auth, body));
    let (status, reply) = stub.replies.lock().unwrap().pop_front().unwrap_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "stub exhausted" } }),
    ));
    (status, Json(reply))
}

async fn spawn_stub(replies: Vec<(StatusCode, Value)>) -> (String, Stub) {
    let stub = Stub {
        replies: Arc::new(Mutex::new(replies.into())),
        ..Default::default()
    };
    let app = Router::new()
        .route("/v1/responses", post(handle))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

fn message_with_text(text: &str) -> Value {
    json!({
        "id": "resp_test",
        "object": "response",
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text, "annotations": [] }]
        }]
    })
}

fn client_for(base_url: &str, max_retries: u32) -> OpenAiClient {
    let mut config = OpenAiConfig::new("test-key");
    config.base_url = base_url.to_string();
    config.max_retries = max_retries;
    OpenAiClient::new(config).unwrap()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn complete_returns_output_text_and_sends_schema_format() {
    let (url, stub) = spawn_stub(vec![(StatusCode::OK, message_with_text(r#"{"tasks":[]}"#))]).await;
    let client = client_for(&url, 0);

    let request = build_request("Launch a blog", Horizon::Today);
    let text = client.complete(&request).await.unwrap();
    assert_eq!(text, r#"{"tasks":[]}"#);

    let (auth, body) = stub.last();
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(
        body["instructions"],
        "You are a helpful planning assistant. Return only JSON."
    );
    assert_eq!(body["input"][0]["role"], "user");
    assert!(
        body["input"][0]["content"]
            .as_str()
            .unwrap()
            .contains("end of today")
    );
    assert_eq!(body["text"]["format"]["type"], "json_schema");
    assert_eq!(body["text"]["format"]["name"], "task_plan");
    assert_eq!(body["text"]["format"]["strict"], true);
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn api_error_surfaces_upstream_message_without_retry() {
    let (url, stub) = spawn_stub(vec![(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } }),
    )])
    .await;
    let client = client_for(&url, 2);

    let err = client
        .complete(&build_request("x", Horizon::Week))
        .await
        .unwrap_err();
    match err {
        LlmError::Api { status, ref message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(stub.calls(), 1, "4xx responses must not be retried");
}

#[tokio::test]
async fn no_retry_by_default_on_server_error() {
    let (url, stub) = spawn_stub(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": { "message": "overloaded" } })),
        (StatusCode::OK, message_with_text("{}")),
    ])
    .await;
    let client = client_for(&url, 0);

    let err = client
        .complete(&build_request("x", Horizon::Week))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 503, .. }), "got {err:?}");
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn bounded_retry_recovers_from_transient_error() {
    let (url, stub) = spawn_stub(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": { "message": "overloaded" } })),
        (StatusCode::OK, message_with_text(r#"{"tasks":[]}"#)),
    ])
    .await;
    let client = client_for(&url, 1);

    let text = client
        .complete(&build_request("x", Horizon::Week))
        .await
        .unwrap();
    assert_eq!(text, r#"{"tasks":[]}"#);
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn response_without_text_yields_empty_string() {
    let (url, _stub) = spawn_stub(vec![(StatusCode::OK, json!({ "id": "resp", "output": [] }))]).await;
    let client = client_for(&url, 0);

    let text = client
        .complete(&build_request("x", Horizon::Week))
        .await
        .unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), 0);
    let err = client
        .complete(&build_request("x", Horizon::Week))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Network(_)), "got {err:?}");
    assert!(err.is_transient());
    assert!(err.to_string().starts_with("network error"), "got: {err}");
}

#[tokio::test]
async fn create_plan_reports_invalid_json_from_real_client() {
    let (url, stub) = spawn_stub(vec![(StatusCode::OK, message_with_text("not json"))]).await;
    let client = client_for(&url, 3);

    let err = create_plan(&client, &PlanOptions::default(), Some("Launch a blog"), Some("week"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidJson { .. }), "got {err:?}");
    assert_eq!(err.raw(), Some("not json"));
    assert_eq!(stub.calls(), 1, "content errors must not be retried");
}
