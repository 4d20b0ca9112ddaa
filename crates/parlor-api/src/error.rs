//! Error types for parlor-api

use thiserror::Error;

/// Result type alias using parlor-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned a non-success status
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// Session token rejected (401)
    #[error("Unauthorized: session expired or token invalid")]
    Unauthorized,

    /// Access to the resource denied (403)
    #[error("Forbidden: no access to this room")]
    Forbidden,

    /// No credential available for an authenticated call
    #[error("Missing credential")]
    MissingCredential,

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from status and detail message
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Unauthorized => Some(401),
            Error::Forbidden => Some(403),
            _ => None,
        }
    }

    /// Check if this error is transient: a retry of the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder(),
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this error means the credential itself is bad
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized | Error::Forbidden | Error::MissingCredential
        )
    }
}
