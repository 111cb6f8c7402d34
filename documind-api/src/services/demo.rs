//! Offline stand-ins for vendors without credentials
//!
//! The service stays usable end to end without any vendor account: classification
//! answers `general`, structuring returns a fixed sample, PDFs are rendered locally and
//! storage is skipped. Transcription has no offline stand-in and reports itself as not
//! configured.

use async_trait::async_trait;
use documind_common::api::{DocumentSummary, OpenTask};
use documind_common::{ActionItem, DocType, StructuredPayload};
use serde_json::{json, Map, Value};

use super::{
    DocumentStore, PdfArtifact, PdfRenderer, ServiceError, StructuredContent, Structurer,
    Transcriber, Transcript,
};
use crate::pdf;

/// Characters of the input quoted in the sample document
const EXCERPT_CHARS: usize = 280;

pub struct UnconfiguredTranscriber;

#[async_trait]
impl Transcriber for UnconfiguredTranscriber {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _content_type: &str,
    ) -> Result<Transcript, ServiceError> {
        Err(ServiceError::NotConfigured("Deepgram"))
    }
}

/// Structurer used when no language model is configured
pub struct SampleStructurer;

#[async_trait]
impl Structurer for SampleStructurer {
    async fn classify(&self, _text: &str) -> Result<DocType, ServiceError> {
        Ok(DocType::General)
    }

    async fn structure(
        &self,
        text: &str,
        doc_type: DocType,
    ) -> Result<StructuredContent, ServiceError> {
        tracing::info!(doc_type = %doc_type, "No language model configured, returning sample document");
        Ok(sample_document(text, doc_type))
    }
}

pub fn sample_document(text: &str, doc_type: DocType) -> StructuredContent {
    let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    let payload = match doc_type {
        DocType::MeetingNotes => StructuredPayload::MeetingNotes {
            action_items: vec![
                ActionItem::open("Fix the login bug", "Alice", "Friday"),
                ActionItem::open("Update the design tokens", "Bob", "Monday"),
            ],
        },
        DocType::Prd => StructuredPayload::Prd {
            requirements: vec![
                "Users can sign in with single sign-on".to_string(),
                "Reports export to CSV".to_string(),
            ],
        },
        DocType::CodeDocs => StructuredPayload::CodeDocs(sample_map(&excerpt)),
        DocType::General => StructuredPayload::General(sample_map(&excerpt)),
    };

    StructuredContent {
        title: format!("{} (Sample)", doc_type.label()),
        summary: "Sample document generated without a language model. Configure \
                  OPENAI_API_KEY for real structuring."
            .to_string(),
        payload,
        extra_sections: Default::default(),
    }
}

fn sample_map(excerpt: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("excerpt".to_string(), json!(excerpt));
    map.insert(
        "key_points".to_string(),
        json!(["Input received", "Structuring ran in offline mode"]),
    );
    map
}

/// Renders a plain local PDF carrying the title and summary
pub struct LocalPdfRenderer;

#[async_trait]
impl PdfRenderer for LocalPdfRenderer {
    async fn render(
        &self,
        _html: &str,
        content: &StructuredContent,
    ) -> Result<Vec<u8>, ServiceError> {
        let mut lines = vec![
            format!("Type: {}", content.doc_type().label()),
            String::new(),
        ];
        lines.extend(content.summary.lines().map(str::to_string));
        for item in content.payload.action_items() {
            lines.push(format!("- {} ({}, {})", item.task, item.owner, item.due_date));
        }
        for requirement in content.payload.requirements() {
            lines.push(format!("- {}", requirement));
        }

        Ok(pdf::simple_pdf(&content.title, &lines))
    }
}

/// Store used when no content store is configured
pub struct DisabledStore;

#[async_trait]
impl DocumentStore for DisabledStore {
    async fn save(
        &self,
        _content: &StructuredContent,
        _pdf: Option<PdfArtifact<'_>>,
    ) -> Result<Option<String>, ServiceError> {
        tracing::debug!("Content store not configured, skipping save");
        Ok(None)
    }

    async fn list(&self, _doc_type: Option<DocType>) -> Result<Vec<DocumentSummary>, ServiceError> {
        Ok(Vec::new())
    }

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ServiceError> {
        Ok(Vec::new())
    }
}
