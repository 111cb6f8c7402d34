//! Vendor integrations
//!
//! Each vendor sits behind a trait so the pipeline and the handlers can run against
//! the real HTTP clients, the offline stand-ins in [`demo`], or test fakes.
//!
//! | Concern | Trait | Vendor client | Without credentials |
//! |---|---|---|---|
//! | Transcription | [`Transcriber`] | [`deepgram_client::DeepgramClient`] | [`demo::UnconfiguredTranscriber`] |
//! | Classification and structuring | [`Structurer`] | [`openai_client::OpenAiClient`] | [`demo::SampleStructurer`] |
//! | PDF generation | [`PdfRenderer`] | [`foxit_client::FoxitClient`] | [`demo::LocalPdfRenderer`] |
//! | Content store | [`DocumentStore`] | [`sanity_client::SanityClient`] | [`demo::DisabledStore`] |

pub mod deepgram_client;
pub mod demo;
pub mod foxit_client;
pub mod openai_client;
pub mod sanity_client;

use async_trait::async_trait;
use documind_common::api::{DocumentSummary, OpenTask};
use documind_common::{DocType, StructuredPayload};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::VendorConfig;

pub const USER_AGENT: &str = concat!("DocuMind/", env!("CARGO_PKG_VERSION"));

/// Default timeout of vendor requests
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Vendor call errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{service} network error: {message}")]
    Network {
        service: &'static str,
        message: String,
    },

    #[error("{service} API error {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} parse error: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },

    /// The vendor answered but produced nothing usable
    #[error("{0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn network(service: &'static str, err: impl std::fmt::Display) -> Self {
        ServiceError::Network {
            service,
            message: err.to_string(),
        }
    }

    pub fn parse(service: &'static str, err: impl std::fmt::Display) -> Self {
        ServiceError::Parse {
            service,
            message: err.to_string(),
        }
    }

    /// Turn a non-success response into [`ServiceError::Api`]
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ServiceError::Api {
            service,
            status,
            body,
        }
    }
}

/// Build the shared reqwest client used by every vendor client
pub(crate) fn http_client(service: &'static str) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ServiceError::network(service, e))
}

// ========================================
// Value types
// ========================================

/// Result of one transcription
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Plain recognized text
    pub text: String,
    /// "Speaker N: ..." paragraphs, when word-level speaker tags were returned
    pub speaker_labelled: Option<String>,
    pub confidence: Option<f64>,
}

impl Transcript {
    /// Speaker-labelled text when available, otherwise the plain transcript
    pub fn preferred_text(&self) -> &str {
        self.speaker_labelled
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.text)
    }
}

/// Output of the structuring step, before a PDF exists
///
/// `extra_sections` holds what the model returned beside the payload of a meeting
/// or PRD (attendees, goals, user stories). It is rendered into the PDF but never
/// sent back as `structured_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredContent {
    pub title: String,
    pub summary: String,
    pub payload: StructuredPayload,
    pub extra_sections: Map<String, Value>,
}

impl StructuredContent {
    pub fn doc_type(&self) -> DocType {
        self.payload.doc_type()
    }
}

/// Generated PDF handed to the content store
#[derive(Debug, Clone, Copy)]
pub struct PdfArtifact<'a> {
    pub filename: &'a str,
    pub bytes: &'a [u8],
}

// ========================================
// Service traits
// ========================================

/// Speech to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, content_type: &str)
        -> Result<Transcript, ServiceError>;
}

/// Language-model classification and structuring
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Decide the document type of `text`
    async fn classify(&self, text: &str) -> Result<DocType, ServiceError>;

    /// Extract title, summary and the type-specific payload
    async fn structure(&self, text: &str, doc_type: DocType)
        -> Result<StructuredContent, ServiceError>;
}

/// HTML to PDF
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, content: &StructuredContent)
        -> Result<Vec<u8>, ServiceError>;
}

/// Persistence and listing of generated documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Save a generated document, returning the record id
    ///
    /// `Ok(None)` means storage is disabled.
    async fn save(
        &self,
        content: &StructuredContent,
        pdf: Option<PdfArtifact<'_>>,
    ) -> Result<Option<String>, ServiceError>;

    /// Stored documents, newest first
    async fn list(&self, doc_type: Option<DocType>) -> Result<Vec<DocumentSummary>, ServiceError>;

    /// Open action items of every meeting-notes record, newest document first
    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ServiceError>;
}

/// Every vendor integration the service talks to
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn Transcriber>,
    pub structurer: Arc<dyn Structurer>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub store: Arc<dyn DocumentStore>,
}

impl Services {
    /// Real clients for configured vendors, offline stand-ins for the rest
    pub fn from_config(vendors: &VendorConfig) -> Result<Self, ServiceError> {
        let transcriber: Arc<dyn Transcriber> = match &vendors.deepgram.api_key {
            Some(key) => Arc::new(deepgram_client::DeepgramClient::new(
                key.clone(),
                vendors.deepgram.base_url.clone(),
            )?),
            None => Arc::new(demo::UnconfiguredTranscriber),
        };

        let structurer: Arc<dyn Structurer> = match &vendors.openai.api_key {
            Some(key) => Arc::new(openai_client::OpenAiClient::new(
                key.clone(),
                vendors.openai.model.clone(),
                vendors.openai.base_url.clone(),
            )?),
            None => Arc::new(demo::SampleStructurer),
        };

        let pdf: Arc<dyn PdfRenderer> = match vendors.foxit.credentials() {
            Some((id, secret)) => Arc::new(foxit_client::FoxitClient::new(
                id.to_string(),
                secret.to_string(),
                vendors.foxit.base_url.clone(),
            )?),
            None => Arc::new(demo::LocalPdfRenderer),
        };

        let store: Arc<dyn DocumentStore> =
            match (vendors.sanity.api_root(), &vendors.sanity.token) {
                (Some(root), Some(token)) => Arc::new(sanity_client::SanityClient::new(
                    root,
                    vendors.sanity.dataset.clone(),
                    token.clone(),
                )?),
                _ => Arc::new(demo::DisabledStore),
            };

        Ok(Self {
            transcriber,
            structurer,
            pdf,
            store,
        })
    }
}
