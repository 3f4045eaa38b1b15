//! Proxy Error Types

use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Proxy error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Object store errors
    #[error("Object store error for '{key}': {reason}")]
    ObjectStore { key: String, reason: String },

    #[error("Object store returned status {status} for '{key}'")]
    ObjectStatus { key: String, status: u16 },

    // Network errors
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an object store error from any displayable backend failure
    pub fn object_store(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::ObjectStore {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error came from the object store backend
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::ObjectStore { .. } | Error::ObjectStatus { .. })
    }
}
