//! Read-through views over the listing, open-task and status endpoints
//!
//! No caching, polling or pagination: each load is one call.

use documind_common::api::{DocumentSummary, IntegrationState, IntegrationStatus, OpenTask};
use documind_common::DocType;
use std::fmt::Write as _;
use tracing::warn;

use crate::client::DocumindApi;

/// State of a listing view
#[derive(Debug, Clone, PartialEq)]
pub enum View<T> {
    Loading,
    Empty,
    Ready(Vec<T>),
}

impl<T> View<T> {
    fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            View::Empty
        } else {
            View::Ready(rows)
        }
    }

    pub fn rows(&self) -> &[T] {
        match self {
            View::Ready(rows) => rows,
            _ => &[],
        }
    }
}

/// Stored documents, optionally filtered by type
///
/// A failing call degrades to [`View::Empty`].
pub async fn load_documents(
    api: &dyn DocumindApi,
    doc_type: Option<DocType>,
) -> View<DocumentSummary> {
    match api.list_documents(doc_type).await {
        Ok(rows) => View::from_rows(rows),
        Err(e) => {
            warn!("Listing documents failed: {}", e.cause());
            View::Empty
        }
    }
}

/// Open action items across meeting notes
///
/// A failing call degrades to [`View::Empty`].
pub async fn load_open_tasks(api: &dyn DocumindApi) -> View<OpenTask> {
    match api.open_tasks().await {
        Ok(rows) => View::from_rows(rows),
        Err(e) => {
            warn!("Listing open tasks failed: {}", e.cause());
            View::Empty
        }
    }
}

/// Integration status; every integration reads `error` when the call fails
pub async fn load_status(api: &dyn DocumindApi) -> IntegrationStatus {
    match api.integration_status().await {
        Ok(status) => status,
        Err(e) => {
            warn!("Integration status failed: {}", e.cause());
            IntegrationStatus::all_error()
        }
    }
}

// ========================================
// Text rendering
// ========================================

pub fn render_documents(view: &View<DocumentSummary>) -> String {
    match view {
        View::Loading => "Loading documents...\n".to_string(),
        View::Empty => "No documents yet.\n".to_string(),
        View::Ready(rows) => {
            let mut out = String::new();
            for doc in rows {
                let created = doc
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let title = if doc.title.is_empty() {
                    "(untitled)"
                } else {
                    doc.title.as_str()
                };
                let _ = writeln!(out, "{:<16}  {:<13}  {}", created, doc.doc_type.label(), title);
                if let Some(summary) = doc.summary.as_deref().filter(|s| !s.is_empty()) {
                    let _ = writeln!(out, "{:<16}  {:<13}  {}", "", "", summary);
                }
            }
            out
        }
    }
}

pub fn render_tasks(view: &View<OpenTask>) -> String {
    match view {
        View::Loading => "Loading tasks...\n".to_string(),
        View::Empty => "No open tasks.\n".to_string(),
        View::Ready(rows) => {
            let mut out = String::new();
            for task in rows {
                let owner = if task.item.owner.is_empty() {
                    "Unassigned"
                } else {
                    task.item.owner.as_str()
                };
                let _ = write!(out, "[ ] {} ({})", task.item.task, owner);
                if !task.item.due_date.is_empty() {
                    let _ = write!(out, " due {}", task.item.due_date);
                }
                if !task.document_title.is_empty() {
                    let _ = write!(out, " - {}", task.document_title);
                }
                out.push('\n');
            }
            out
        }
    }
}

pub fn render_status(status: &IntegrationStatus) -> String {
    let mut out = String::new();
    for (label, description, state) in status.rows() {
        let marker = match state {
            IntegrationState::Connected => "ok",
            IntegrationState::Disconnected => "--",
            IntegrationState::Error => "!!",
        };
        let _ = writeln!(
            out,
            "[{}] {:<18} {:<13} {}",
            marker,
            label,
            state.as_str(),
            description
        );
    }
    out
}
