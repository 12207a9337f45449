//! Error types for anidex.

use thiserror::Error;

/// Result type alias using anidex's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for anidex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Remote service reported quota exhaustion (retryable)
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A remote call kept hitting the quota until the retry budget ran out
    #[error("Retry budget exhausted: {operation} failed after {attempts} attempts")]
    RetryBudgetExhausted { operation: String, attempts: u32 },

    /// Configuration error (missing header, missing setting)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is the remote service's "quota exceeded" signal.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::QuotaExceeded(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
