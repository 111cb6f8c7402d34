//! Integration tests for the documind-api router
//!
//! Vendors are replaced by in-process fakes; the router is driven with
//! `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use documind_api::config::{
    DeepgramConfig, FoxitConfig, OpenAiConfig, SanityConfig, VendorConfig,
};
use documind_api::services::demo::LocalPdfRenderer;
use documind_api::services::{
    DocumentStore, PdfArtifact, ServiceError, Services, StructuredContent, Structurer,
    Transcriber, Transcript,
};
use documind_api::{build_router, AppState};
use documind_common::api::{
    DocumentSummary, IntegrationState, IntegrationStatus, OpenTask,
};
use documind_common::{ActionItem, DocType, StructuredPayload};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// Fakes
// ============================================================================

struct FakeStructurer {
    fail: bool,
}

#[async_trait]
impl Structurer for FakeStructurer {
    async fn classify(&self, _text: &str) -> Result<DocType, ServiceError> {
        Ok(DocType::MeetingNotes)
    }

    async fn structure(
        &self,
        _text: &str,
        doc_type: DocType,
    ) -> Result<StructuredContent, ServiceError> {
        if self.fail {
            return Err(ServiceError::Api {
                service: "OpenAI",
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }
        assert_eq!(doc_type, DocType::MeetingNotes);
        Ok(StructuredContent {
            title: "Team Sync".to_string(),
            summary: "Weekly sync.".to_string(),
            payload: StructuredPayload::MeetingNotes {
                action_items: vec![ActionItem::open("ship the report", "Alice", "Friday")],
            },
            extra_sections: Default::default(),
        })
    }
}

struct FakeTranscriber {
    fail: bool,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<Transcript, ServiceError> {
        if self.fail {
            return Err(ServiceError::network("Deepgram", "connection refused"));
        }
        assert_eq!(content_type, "audio/webm");
        Ok(Transcript {
            text: format!("{} bytes of audio", audio.len()),
            speaker_labelled: Some("Speaker 0: Alice will ship the report by Friday.".to_string()),
            confidence: Some(0.93),
        })
    }
}

#[derive(Default)]
struct FakeStore {
    fail: bool,
    saved: Mutex<Vec<(String, Option<String>)>>,
    list_filters: Mutex<Vec<Option<DocType>>>,
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn save(
        &self,
        content: &StructuredContent,
        pdf: Option<PdfArtifact<'_>>,
    ) -> Result<Option<String>, ServiceError> {
        if self.fail {
            return Err(ServiceError::network("Sanity", "timed out"));
        }
        self.saved
            .lock()
            .unwrap()
            .push((content.title.clone(), pdf.map(|p| p.filename.to_string())));
        Ok(Some("doc-1".to_string()))
    }

    async fn list(&self, doc_type: Option<DocType>) -> Result<Vec<DocumentSummary>, ServiceError> {
        if self.fail {
            return Err(ServiceError::network("Sanity", "timed out"));
        }
        self.list_filters.lock().unwrap().push(doc_type);
        Ok(vec![DocumentSummary {
            id: "doc-1".to_string(),
            title: "Team Sync".to_string(),
            doc_type: DocType::MeetingNotes,
            created_at: None,
            summary: Some("Weekly sync.".to_string()),
        }])
    }

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ServiceError> {
        Ok(vec![OpenTask {
            document_id: "doc-1".to_string(),
            document_title: "Team Sync".to_string(),
            item: ActionItem::open("ship the report", "Alice", "Friday"),
        }])
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct TestApp {
    router: Router,
    store: Arc<FakeStore>,
    output: TempDir,
}

fn integrations() -> IntegrationStatus {
    IntegrationStatus {
        openai: IntegrationState::Connected,
        deepgram: IntegrationState::Connected,
        foxit: IntegrationState::Disconnected,
        sanity: IntegrationState::Connected,
    }
}

fn test_app_with(structurer_fails: bool, transcriber_fails: bool, store: FakeStore) -> TestApp {
    let output = TempDir::new().unwrap();
    let store = Arc::new(store);
    let services = Services {
        transcriber: Arc::new(FakeTranscriber {
            fail: transcriber_fails,
        }),
        structurer: Arc::new(FakeStructurer {
            fail: structurer_fails,
        }),
        pdf: Arc::new(LocalPdfRenderer),
        store: store.clone(),
    };
    let state = AppState::new(services, integrations(), output.path().to_path_buf());
    TestApp {
        router: build_router(state),
        store,
        output,
    }
}

fn test_app() -> TestApp {
    test_app_with(false, false, FakeStore::default())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

const BOUNDARY: &str = "documind-test-boundary";

fn multipart_request(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"memo.webm\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/transcribe-audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn assert_envelope(body: &Value, status: StatusCode, detail: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], format!("http_{}", status.as_u16()));
    assert_eq!(body["detail"], detail);
    assert!(body["timestamp"].is_string());
}

// ============================================================================
// Health and status
// ============================================================================

#[tokio::test]
async fn test_health_and_banner() {
    let app = test_app();

    let (status, body) = get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "documind-api");
    assert!(body["uptime_seconds"].is_u64());
    assert!(body.get("last_error").is_none());

    let (status, body) = get_json(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["links"]["process_text"], "/api/process-text");
}

#[tokio::test]
async fn test_integration_status() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/api/integrations/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"openai": "connected", "deepgram": "connected", "foxit": "disconnected", "sanity": "connected"})
    );
}

// ============================================================================
// POST /api/process-text
// ============================================================================

#[tokio::test]
async fn test_process_text_then_download() {
    let app = test_app();

    let (status, body) = post_json(
        &app.router,
        "/api/process-text",
        json!({"text": "Alice will ship the report by Friday", "source_type": "text"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["doc_type"], "meeting_notes");
    assert_eq!(body["title"], "Team Sync");
    assert_eq!(body["summary"], "Weekly sync.");
    assert_eq!(
        body["structured_data"],
        json!({"actionItems": [{"task": "ship the report", "owner": "Alice", "dueDate": "Friday", "status": "open"}]})
    );

    let pdf_path = body["pdf_path"].as_str().unwrap();
    let filename = documind_common::artifact_filename(pdf_path).unwrap().to_string();
    assert!(filename.starts_with("meeting_notes_"));
    assert!(app.output.path().join(&filename).exists());

    let saved = app.store.saved.lock().unwrap().clone();
    assert_eq!(saved, vec![("Team Sync".to_string(), Some(filename.clone()))]);

    let request = Request::builder()
        .uri(format!("/api/download/{}", filename))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains(&filename));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn test_process_text_rejects_blank_text() {
    let app = test_app();

    let (status, body) =
        post_json(&app.router, "/api/process-text", json!({"text": "   \n\t"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, status, "Text input cannot be empty.");
    assert!(app.store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_text_rejects_malformed_body() {
    let app = test_app();
    let (status, body) = post_json(&app.router, "/api/process-text", json!({"txt": "x"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_pipeline_failure_is_500_and_recorded() {
    let app = test_app_with(true, false, FakeStore::default());

    let (status, body) = post_json(
        &app.router,
        "/api/process-text",
        json!({"text": "Alice will ship the report by Friday"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Pipeline processing failed: Structuring failed"));
    assert!(detail.contains("quota exceeded"));

    let (_, health) = get_json(&app.router, "/health").await;
    assert_eq!(health["last_error"], detail);
}

#[tokio::test]
async fn test_store_failure_does_not_fail_pipeline() {
    let app = test_app_with(
        false,
        false,
        FakeStore {
            fail: true,
            ..Default::default()
        },
    );

    let (status, body) = post_json(
        &app.router,
        "/api/process-text",
        json!({"text": "Alice will ship the report by Friday"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Team Sync");
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_list_documents_with_filter() {
    let app = test_app();

    let (status, body) = get_json(&app.router, "/api/documents?doc_type=prd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["_id"], "doc-1");
    assert_eq!(body[0]["doc_type"], "meeting_notes");

    let (status, _) = get_json(&app.router, "/api/documents").await;
    assert_eq!(status, StatusCode::OK);

    let filters = app.store.list_filters.lock().unwrap().clone();
    assert_eq!(filters, vec![Some(DocType::Prd), None]);
}

#[tokio::test]
async fn test_list_documents_rejects_unknown_type() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/api/documents?doc_type=recipes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("recipes"));
    assert!(app.store.list_filters.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_documents_store_failure_is_502() {
    let app = test_app_with(
        false,
        false,
        FakeStore {
            fail: true,
            ..Default::default()
        },
    );
    let (status, body) = get_json(&app.router, "/api/documents").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().starts_with("Listing documents failed"));
}

#[tokio::test]
async fn test_open_tasks() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/api/documents/tasks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["document_title"], "Team Sync");
    assert_eq!(body[0]["task"], "ship the report");
    assert_eq!(body[0]["status"], "open");
}

// ============================================================================
// POST /api/transcribe-audio
// ============================================================================

#[tokio::test]
async fn test_transcribe_audio() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("file", "audio/webm", b"RIFF....WAVEfmt "),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["transcript"],
        "Speaker 0: Alice will ship the report by Friday."
    );
    assert_eq!(body["confidence"], 0.93);
}

#[tokio::test]
async fn test_transcribe_audio_without_file_field() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("attachment", "audio/webm", b"data"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_envelope(&body, status, "No file uploaded.");
}

#[tokio::test]
async fn test_transcribe_audio_empty_file() {
    let app = test_app();
    let (status, body) = send(&app.router, multipart_request("file", "audio/webm", b"")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_envelope(&body, status, "Uploaded file is empty.");
}

#[tokio::test]
async fn test_transcribe_audio_vendor_failure() {
    let app = test_app_with(false, true, FakeStore::default());
    let (status, body) = send(
        &app.router,
        multipart_request("file", "audio/webm", b"data"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Transcription failed: Deepgram network error"));
}

// ============================================================================
// GET /api/download/:filename
// ============================================================================

#[tokio::test]
async fn test_download_missing_file_is_404() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/api/download/absent.pdf").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, status, "File not found");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let app = test_app();
    std::fs::write(app.output.path().join("notes.pdf"), b"%PDF-1.4").unwrap();

    let (status, body) = get_json(&app.router, "/api/download/..%2Fnotes.pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(&app.router, "/api/download/..%5Cnotes.pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Offline mode
// ============================================================================

fn unconfigured_vendors() -> VendorConfig {
    VendorConfig {
        openai: OpenAiConfig {
            api_key: None,
            model: "gpt-4o".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        deepgram: DeepgramConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
        },
        foxit: FoxitConfig {
            client_id: None,
            client_secret: None,
            base_url: "http://127.0.0.1:9".to_string(),
        },
        sanity: SanityConfig {
            project_id: None,
            dataset: "production".to_string(),
            token: None,
            base_url: None,
        },
    }
}

#[tokio::test]
async fn test_unconfigured_service_runs_offline() {
    let output = TempDir::new().unwrap();
    let vendors = unconfigured_vendors();
    let services = Services::from_config(&vendors).unwrap();
    let state = AppState::new(
        services,
        vendors.integration_status(),
        output.path().to_path_buf(),
    );
    let router = build_router(state);

    let (status, body) = get_json(&router, "/api/integrations/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"openai": "disconnected", "deepgram": "disconnected", "foxit": "disconnected", "sanity": "disconnected"})
    );

    let (status, body) =
        post_json(&router, "/api/process-text", json!({"text": "Groceries: milk, eggs"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc_type"], "general");
    assert_eq!(body["structured_data"]["excerpt"], "Groceries: milk, eggs");
    let filename = documind_common::artifact_filename(body["pdf_path"].as_str().unwrap())
        .unwrap()
        .to_string();
    assert!(output.path().join(filename).exists());

    let (status, body) = get_json(&router, "/api/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&router, multipart_request("file", "audio/webm", b"data")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["detail"], "Transcription failed: Deepgram is not configured");
}
