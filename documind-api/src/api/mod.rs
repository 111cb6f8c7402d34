//! HTTP API handlers for documind-api

pub mod audio;
pub mod documents;
pub mod download;
pub mod health;
pub mod integrations;

pub use audio::audio_routes;
pub use documents::document_routes;
pub use download::download_routes;
pub use health::health_routes;
pub use integrations::integration_routes;
