//! Store adapter error types.

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a store backend.
///
/// Row absence is not an error: lookups return `Option`/empty collections so
/// callers can treat "not found" as the recoverable case it is (lazy profile
/// creation, promotion of a deleted task).
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store answered with a non-success status.
    #[error("store error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The store answered success but the response could not be interpreted
    /// (missing count header, empty representation).
    #[error("malformed store response: {0}")]
    Malformed(String),

    /// The backend refused the operation (used by test doubles to inject
    /// failures into rollback paths).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Injected-failure constructor used by test doubles.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
