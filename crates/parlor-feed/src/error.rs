//! Error types for parlor-feed

use thiserror::Error;

/// Result type alias using parlor-feed Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the feed layer
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire layer
    #[error(transparent)]
    Api(#[from] parlor_api::Error),

    /// An operation that needs an active room was called without one
    #[error("no active room")]
    NoActiveRoom,
}

impl Error {
    /// Check if retrying the same operation could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(e) => e.is_retryable(),
            Error::NoActiveRoom => false,
        }
    }
}
