//! Error types for the backend gateway and local persistence.

use thiserror::Error;

/// Gateway error type.
///
/// Every variant is recoverable: the controller turns them into localized
/// inline messages and never lets them escape an operation.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// Local I/O failed (reading an upload from disk).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Whether the error came from the transport rather than the backend.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Io(_))
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from the preference store.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// Reading or writing the preference file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Preference file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
