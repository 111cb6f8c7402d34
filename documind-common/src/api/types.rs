//! Request/response types of the `/api/*` boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::document::{ActionItem, DocType, StructuredDocument, StructuredPayload};

// ========================================
// Requests
// ========================================

/// Where the submitted text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Typed or pasted text
    #[default]
    Text,
    /// Transcribed voice memo
    Voice,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Voice => "voice",
        }
    }
}

/// Body of `POST /api/process-text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTextRequest {
    /// Raw text to process (meeting notes, PRD, code docs, ...)
    pub text: String,
    #[serde(default)]
    pub source_type: SourceType,
}

// ========================================
// Responses
// ========================================

/// Response of `POST /api/process-text`
///
/// # Examples
///
/// ```
/// use documind_common::api::DocumentResponse;
/// use documind_common::StructuredDocument;
///
/// let body = r#"{
///     "doc_type": "meeting_notes",
///     "title": "Team Sync",
///     "structured_data": {"actionItems": [{"task": "ship the report", "owner": "Alice", "dueDate": "Friday", "status": "open"}]},
///     "pdf_path": "output/notes.pdf"
/// }"#;
/// let response: DocumentResponse = serde_json::from_str(body).unwrap();
/// let document = StructuredDocument::try_from(response).unwrap();
/// assert_eq!(document.artifact_filename(), Some("notes.pdf"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    #[serde(default = "success")]
    pub success: bool,
    pub doc_type: DocType,
    pub title: String,
    /// Payload in the wire shape for `doc_type`
    pub structured_data: Value,
    /// Path of the generated PDF
    pub pdf_path: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_document(document: &StructuredDocument) -> Self {
        Self {
            success: true,
            doc_type: document.doc_type(),
            title: document.title.clone(),
            structured_data: document.payload.to_value(),
            pdf_path: document.artifact_reference.clone(),
            summary: document.summary.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl TryFrom<DocumentResponse> for StructuredDocument {
    type Error = crate::Error;

    fn try_from(response: DocumentResponse) -> crate::Result<Self> {
        let payload = StructuredPayload::from_value(response.doc_type, response.structured_data)?;
        Ok(StructuredDocument {
            title: response.title,
            payload,
            summary: response.summary,
            artifact_reference: response.pdf_path,
        })
    }
}

/// Response of `POST /api/transcribe-audio`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default = "success")]
    pub success: bool,
    /// Recognized text (speaker-labelled when diarization was available)
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Most recent pipeline failure, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Standard error envelope
///
/// `detail` is the human-readable message a client surfaces verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    /// Error type or code (e.g. `http_400`)
    pub error: String,
    pub detail: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

fn success() -> bool {
    true
}

// ========================================
// Integration status
// ========================================

/// Reachability of one vendor integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationState {
    Connected,
    #[serde(alias = "missing")]
    Disconnected,
    Error,
}

impl IntegrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationState::Connected => "connected",
            IntegrationState::Disconnected => "disconnected",
            IntegrationState::Error => "error",
        }
    }
}

/// Response of `GET /api/integrations/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStatus {
    /// Language model (classification and structuring)
    pub openai: IntegrationState,
    /// Voice transcription
    pub deepgram: IntegrationState,
    /// PDF generation
    pub foxit: IntegrationState,
    /// Content store
    pub sanity: IntegrationState,
}

impl IntegrationStatus {
    /// Fallback shown when the status call itself fails
    pub fn all_error() -> Self {
        Self {
            openai: IntegrationState::Error,
            deepgram: IntegrationState::Error,
            foxit: IntegrationState::Error,
            sanity: IntegrationState::Error,
        }
    }

    /// `(label, description, state)` rows in display order
    pub fn rows(&self) -> [(&'static str, &'static str, IntegrationState); 4] {
        [
            (
                "OpenAI (AI Agent)",
                "Powers document structuring and classification.",
                self.openai,
            ),
            (
                "Deepgram (Voice)",
                "Handles high-accuracy voice transcription.",
                self.deepgram,
            ),
            (
                "Foxit PDF",
                "Generates professional PDFs.",
                self.foxit,
            ),
            (
                "Sanity CMS",
                "Stores structured content and archives.",
                self.sanity,
            ),
        ]
    }
}

// ========================================
// Listings
// ========================================

/// One row of `GET /api/documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "general", deserialize_with = "lenient_doc_type")]
    pub doc_type: DocType,
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One row of `GET /api/documents/tasks`: an open action item and its document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTask {
    pub document_id: String,
    #[serde(default)]
    pub document_title: String,
    #[serde(flatten)]
    pub item: ActionItem,
}

fn general() -> DocType {
    DocType::General
}

/// Stored records may carry a missing or legacy type name
fn lenient_doc_type<'de, D>(deserializer: D) -> Result<DocType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|name| DocType::from_classifier_answer(&name))
        .unwrap_or(DocType::General))
}
