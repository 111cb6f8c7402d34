//! Document endpoints: processing, listing and open tasks

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use documind_common::api::{paths, DocumentResponse, DocumentSummary, OpenTask, ProcessTextRequest};
use documind_common::DocType;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{process_document, PipelineError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub doc_type: Option<String>,
}

/// POST /api/process-text
///
/// Run the document pipeline on raw text.
///
/// **Request:** `{ "text": "...", "source_type": "text" | "voice" }`
/// **Response:** [`DocumentResponse`]
///
/// **Errors:**
/// - 400: blank text or malformed body
/// - 500: any pipeline stage failed
pub async fn process_text(
    State(state): State<AppState>,
    body: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> ApiResult<Json<DocumentResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest(PipelineError::EmptyInput.to_string()));
    }

    let processed = process_document(
        &state.services,
        &state.output_dir,
        &request.text,
        request.source_type,
    )
    .await;

    match processed {
        Ok(processed) => {
            info!(
                doc_type = %processed.document.doc_type(),
                title = %processed.document.title,
                record_id = ?processed.record_id,
                "Document processed"
            );
            Ok(Json(DocumentResponse::from_document(&processed.document)))
        }
        Err(e) => {
            let message = format!("Pipeline processing failed: {}", e);
            state.record_error(message.clone()).await;
            Err(ApiError::Internal(message))
        }
    }
}

/// GET /api/documents?doc_type=<optional>
///
/// **Errors:**
/// - 400: unknown document type
/// - 502: content store query failed
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<DocumentSummary>>> {
    let doc_type = match query.doc_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(name.parse::<DocType>()?),
    };

    let documents = state
        .services
        .store
        .list(doc_type)
        .await
        .map_err(|e| ApiError::Upstream(format!("Listing documents failed: {}", e)))?;

    Ok(Json(documents))
}

/// GET /api/documents/tasks
///
/// Open action items across all meeting notes, newest document first.
pub async fn open_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<OpenTask>>> {
    let tasks = state
        .services
        .store
        .open_tasks()
        .await
        .map_err(|e| ApiError::Upstream(format!("Listing open tasks failed: {}", e)))?;

    Ok(Json(tasks))
}

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route(paths::PROCESS_TEXT, post(process_text))
        .route(paths::DOCUMENTS, get(list_documents))
        .route(paths::OPEN_TASKS, get(open_tasks))
}
