use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use planner_core::llm::{CompletionService, OpenAiClient};
use planner_core::plan::{self, PlanError, PlanOptions, PlanRequest};

use crate::config::PlannerConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    raw: Option<String>,
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        if err.is_client_error() {
            return Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
                raw: None,
            };
        }
        if err.is_bad_upstream_content() {
            return Self {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
                raw: err.raw().map(str::to_owned),
            };
        }

        tracing::error!(error = %err, "POST /plan failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: server_error_message(err.to_string()),
            raw: None,
        }
    }
}

/// Body text for a 500; an error with no message still gets one.
fn server_error_message(message: String) -> String {
    if message.is_empty() {
        "Server error".to_string()
    } else {
        message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = match self.raw {
            Some(raw) => serde_json::json!({ "error": self.message, "raw": raw }),
            None => serde_json::json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared, read-only handler state. The completion service is built once.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn CompletionService>,
    pub options: PlanOptions,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/plan", post(create_plan))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: PlannerConfig) -> Result<()> {
    let client = OpenAiClient::new(config.openai)?;
    tracing::info!(model = client.model(), "completion client ready");

    let state = AppState {
        service: Arc::new(client),
        options: config.plan,
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("planner listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("planner shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_plan(
    State(state): State<AppState>,
    body: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    // An unreadable body carries neither field.
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(%rejection, "create_plan: body rejected");
            PlanRequest::default()
        }
    };

    let value = plan::create_plan(
        state.service.as_ref(),
        &state.options,
        request.goal().as_deref(),
        request.horizon().as_deref(),
    )
    .await?;
    Ok(Json(value))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
