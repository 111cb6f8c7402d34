//! Health check and banner endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use documind_common::api::{paths, HealthResponse};
use serde_json::{json, Value};

use crate::AppState;

pub const SERVICE_NAME: &str = "documind-api";

/// GET /health
///
/// Returns real uptime and the last pipeline failure, if any.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        last_error,
        timestamp: Utc::now(),
    })
}

/// GET /
pub async fn banner() -> Json<Value> {
    Json(json!({
        "service": "DocuMind API",
        "version": env!("CARGO_PKG_VERSION"),
        "links": {
            "health": paths::HEALTH,
            "integrations": paths::INTEGRATION_STATUS,
            "documents": paths::DOCUMENTS,
            "open_tasks": paths::OPEN_TASKS,
            "process_text": paths::PROCESS_TEXT,
            "transcribe_audio": paths::TRANSCRIBE_AUDIO,
        }
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route(paths::HEALTH, get(health_check))
}
