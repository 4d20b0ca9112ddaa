//! Credential seam for authenticated calls.
//!
//! The transport layers never read token state of their own; the owner of the
//! session injects a [`CredentialProvider`] at construction time.

use std::sync::Arc;

/// Source of the bearer token for authenticated requests.
///
/// Returning `None` means no session is active; authenticated calls fail
/// with [`crate::Error::MissingCredential`] instead of going out unsigned.
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if a session is active.
    fn token(&self) -> Option<String>;
}

/// A fixed token, useful for tools and tests.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// Hook invoked when the backend rejects the session token (401).
///
/// Typically wired to a logout / re-login flow by the embedding application.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;
