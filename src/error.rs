//! Error types for the yandex_disk crate.

use thiserror::Error;

/// Errors that can occur when talking to the Yandex.Disk API.
#[derive(Error, Debug)]
pub enum DiskError {
    #[error("HTTP transport failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid client configuration: {0}")]
    ConfigError(String),

    #[error("API error ({status})")]
    ApiError { status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for DiskError.
pub type Result<T> = std::result::Result<T, DiskError>;
