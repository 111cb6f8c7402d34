//! # documind-ui
//!
//! Client side of DocuMind: the Document Generation Wizard and the thin
//! listing/status views, talking to documind-api over HTTP.
//!
//! - [`wizard`]: pure state machine (input → processing → preview → result)
//! - [`controller`]: single-owner task that runs the machine's effects
//! - [`client`]: typed HTTP client for the `/api/*` boundary
//! - [`recorder`]: voice memo capture
//! - [`views`]: document listing, open tasks and integration status

pub mod client;
pub mod controller;
pub mod recorder;
pub mod views;
pub mod wizard;

pub use client::{ClientError, DocumindApi, HttpApiClient};
pub use controller::{DispatchError, WizardController};
pub use recorder::{AudioRecorder, FileRecorder, RecorderError};
pub use wizard::{Action, Effect, Rejection, Step, WizardState};
