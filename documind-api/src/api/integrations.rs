//! Integration status endpoint

use axum::{extract::State, routing::get, Json, Router};
use documind_common::api::{paths, IntegrationStatus};

use crate::AppState;

/// GET /api/integrations/status
///
/// `connected` for every vendor whose credentials are configured, `disconnected`
/// otherwise. No vendor is contacted.
pub async fn integration_status(State(state): State<AppState>) -> Json<IntegrationStatus> {
    Json(state.integrations)
}

pub fn integration_routes() -> Router<AppState> {
    Router::new().route(paths::INTEGRATION_STATUS, get(integration_status))
}
