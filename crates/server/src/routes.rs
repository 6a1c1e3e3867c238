//! HTTP surface.
//!
//! - `POST /chat`   run one assistant turn (optionally guarded by `x-api-key`)
//! - `GET  /health` readiness probe covering the demo data directory
//! - `GET  /`       service banner

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::service::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
    /// When set, `/chat` requires a matching `x-api-key` header.
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub data_dir: &'static str,
    pub checked_at: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub description: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(state)
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(expected) = &state.api_key {
        let provided = headers.get("x-api-key").and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse { error: "invalid or missing API key".to_string() }),
            ));
        }
    }

    let message = request.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "message must not be empty".to_string() }),
        ));
    }

    let request_id = Uuid::new_v4();
    info!(
        event_name = "http.chat.received",
        request_id = %request_id,
        message_len = message.len(),
        "chat request received"
    );

    let reply = state.service.handle(message).await;

    info!(
        event_name = "http.chat.replied",
        request_id = %request_id,
        tool_iterations = reply.tool_iterations,
        turn_retries = reply.turn_retries,
        "chat request answered"
    );
    Ok(Json(ChatResponse { response: reply.reply }))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let data_ready = tokio::fs::metadata(&state.data_dir)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);

    let payload = HealthResponse {
        status: if data_ready { "ready" } else { "degraded" },
        data_dir: if data_ready { "ready" } else { "missing" },
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if data_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "swapdesk-server",
        description: "Customer service assistant for the Swapdesk marketplace",
    })
}
