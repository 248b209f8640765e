//! FlatDAV Error Types

use thiserror::Error;

/// Result type alias for FlatDAV operations
pub type Result<T> = std::result::Result<T, Error>;

/// FlatDAV error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("S3 client error: {0}")]
    S3(#[from] s3::error::S3Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error came from talking to the object store
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::S3(_) | Error::Network(_))
    }
}
