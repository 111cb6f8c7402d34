//! Document pipeline
//!
//! trim → classify → structure → render HTML → generate PDF → write artifact → save
//! record. Saving to the content store never fails the pipeline.

use documind_common::api::SourceType;
use documind_common::{DocType, StructuredDocument};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::render::render_html;
use crate::services::{PdfArtifact, ServiceError, Services};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Text input cannot be empty.")]
    EmptyInput,

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("Writing PDF failed: {0}")]
    Io(#[from] std::io::Error),
}

fn stage(stage: &'static str) -> impl FnOnce(ServiceError) -> PipelineError {
    move |source| PipelineError::Stage { stage, source }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub document: StructuredDocument,
    /// Content-store record id, `None` when storage was skipped or failed
    pub record_id: Option<String>,
}

/// File name of a generated PDF: `<doc_type>_<uuid>.pdf`
pub fn artifact_name(doc_type: DocType) -> String {
    format!("{}_{}.pdf", doc_type, Uuid::new_v4().simple())
}

/// Turn raw text into a classified, structured document with a PDF in `output_dir`
pub async fn process_document(
    services: &Services,
    output_dir: &Path,
    raw_text: &str,
    source: SourceType,
) -> Result<ProcessedDocument, PipelineError> {
    let text = raw_text.trim();
    if text.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    tracing::info!(source = source.as_str(), chars = text.len(), "Starting document pipeline");

    let doc_type = services
        .structurer
        .classify(text)
        .await
        .map_err(stage("Classification"))?;
    tracing::info!(doc_type = %doc_type, "Classified document");

    let content = services
        .structurer
        .structure(text, doc_type)
        .await
        .map_err(stage("Structuring"))?;

    let html = render_html(&content);
    let pdf_bytes = services
        .pdf
        .render(&html, &content)
        .await
        .map_err(stage("PDF generation"))?;

    tokio::fs::create_dir_all(output_dir).await?;
    let filename = artifact_name(content.doc_type());
    let pdf_path = output_dir.join(&filename);
    tokio::fs::write(&pdf_path, &pdf_bytes).await?;
    tracing::info!(path = %pdf_path.display(), bytes = pdf_bytes.len(), "Document ready");

    let record_id = match services
        .store
        .save(
            &content,
            Some(PdfArtifact {
                filename: &filename,
                bytes: &pdf_bytes,
            }),
        )
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Saving to content store failed (non-blocking)");
            None
        }
    };

    Ok(ProcessedDocument {
        document: StructuredDocument {
            title: content.title,
            payload: content.payload,
            summary: content.summary,
            artifact_reference: pdf_path.to_string_lossy().into_owned(),
        },
        record_id,
    })
}
