//! # DocuMind Common Library
//!
//! Shared code for the DocuMind backend (documind-api) and client (documind-ui):
//! - Document model with the structured payload keyed by document type
//! - Request/response types of the `/api/*` HTTP boundary
//! - Configuration loading (CLI → ENV → TOML → compiled defaults)
//! - Common error type

pub mod api;
pub mod config;
pub mod document;
pub mod error;

pub use document::{
    artifact_filename, ActionItem, DocType, StructuredDocument, StructuredPayload, TaskStatus,
};
pub use error::{Error, Result};
