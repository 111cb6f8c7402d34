//! Shared HTTP API definitions
//!
//! Route paths and request/response types of the `/api/*` boundary. documind-api
//! serves these routes; documind-ui consumes them. Only plain data lives here, no
//! HTTP framework types.

pub mod types;

pub use types::{
    DocumentResponse, DocumentSummary, ErrorResponse, HealthResponse, IntegrationState,
    IntegrationStatus, OpenTask, ProcessTextRequest, SourceType, TranscribeResponse,
};

/// Route paths shared by server and client
pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const INTEGRATION_STATUS: &str = "/api/integrations/status";
    pub const DOCUMENTS: &str = "/api/documents";
    pub const OPEN_TASKS: &str = "/api/documents/tasks";
    pub const PROCESS_TEXT: &str = "/api/process-text";
    pub const TRANSCRIBE_AUDIO: &str = "/api/transcribe-audio";
    /// Prefix of `GET /api/download/:filename`
    pub const DOWNLOAD: &str = "/api/download";

    /// Multipart field carrying the audio upload
    pub const AUDIO_FIELD: &str = "file";
}
