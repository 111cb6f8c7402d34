//! Voice memo transcription endpoint

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use documind_common::api::{paths, TranscribeResponse};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const FALLBACK_CONTENT_TYPE: &str = "audio/*";

/// POST /api/transcribe-audio
///
/// **Request:** multipart form with the recording in field `file`
/// **Response:** [`TranscribeResponse`]
///
/// **Errors:**
/// - 400: no file, empty file, malformed multipart body
/// - 500: transcription failed
pub async fn transcribe_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<TranscribeResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(paths::AUDIO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        upload = Some((filename, content_type, bytes));
        break;
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty.".to_string()));
    }

    if !is_media_type(&content_type) {
        warn!(content_type = %content_type, filename = %filename, "Unusual content type for audio upload");
    }

    info!(filename = %filename, bytes = bytes.len(), "Received audio upload");

    let transcript = state
        .services
        .transcriber
        .transcribe(bytes.to_vec(), &content_type)
        .await
        .map_err(|e| ApiError::Internal(format!("Transcription failed: {}", e)))?;

    Ok(Json(TranscribeResponse {
        success: true,
        transcript: transcript.preferred_text().to_string(),
        confidence: transcript.confidence,
        timestamp: Utc::now(),
    }))
}

fn is_media_type(content_type: &str) -> bool {
    content_type.starts_with("audio/")
        || content_type.starts_with("video/")
        || content_type == "application/octet-stream"
}

pub fn audio_routes() -> Router<AppState> {
    Router::new().route(paths::TRANSCRIBE_AUDIO, post(transcribe_audio))
}
