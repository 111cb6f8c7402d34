//! Artifact download endpoint

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use documind_common::api::paths;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/download/:filename
///
/// Serves a generated PDF from the output directory as an attachment.
///
/// **Errors:**
/// - 400: the name contains a path separator or `..`
/// - 404: no such file
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !is_plain_filename(&filename) {
        return Err(ApiError::BadRequest(format!("Invalid file name: {}", filename)));
    }

    let path = state.output_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("File not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(filename = %filename, bytes = bytes.len(), "Serving artifact");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// A single path segment: no separators, no parent references
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

pub fn download_routes() -> Router<AppState> {
    Router::new().route(&format!("{}/:filename", paths::DOWNLOAD), get(download))
}
