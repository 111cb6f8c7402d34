//! Common error types for DocuMind

use thiserror::Error;

/// Common result type for DocuMind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the backend and the client
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payload did not match the shape required by its document type
    #[error("Invalid structured payload: {0}")]
    Payload(String),
}
