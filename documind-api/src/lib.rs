//! documind-api library interface
//!
//! The DocuMind backend: classifies and structures raw text with a language model,
//! transcribes voice memos, renders PDFs and keeps a record of every generated
//! document. Exposed as a library so integration tests can drive the router directly.

pub mod api;
pub mod config;
pub mod error;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use documind_common::api::IntegrationStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::services::Services;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Vendor integrations (real clients or offline stand-ins)
    pub services: Services,
    /// Configured-or-not report computed at startup
    pub integrations: IntegrationStatus,
    /// Generated PDFs are written to and served from here
    pub output_dir: PathBuf,
    /// Largest accepted audio upload in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last pipeline failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(services: Services, integrations: IntegrationStatus, output_dir: PathBuf) -> Self {
        Self {
            services,
            integrations,
            output_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::health_routes())
        .merge(api::integration_routes())
        .merge(api::document_routes())
        .merge(api::audio_routes())
        .merge(api::download_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
