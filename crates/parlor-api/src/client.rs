//! HTTP plumbing shared by every endpoint.
//!
//! All endpoints except auth require a bearer token; a 401 response invokes
//! the injected unauthorized handler (logout flow) on top of the typed error.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::{CredentialProvider, UnauthorizedHandler};
use crate::error::{Error, Result};

/// Typed client for the backend's REST API.
///
/// Cheap to clone; clones share the connection pool and credential source.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl ApiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            on_unauthorized: None,
        }
    }

    /// Install a hook invoked whenever the backend answers 401.
    pub fn with_unauthorized_handler(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    /// Base URL with no trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The credential source this client signs requests with.
    pub fn credentials(&self) -> Arc<dyn CredentialProvider> {
        Arc::clone(&self.credentials)
    }

    /// Live-channel URL for a room, credential embedded in the URI.
    ///
    /// The channel handshake cannot carry custom headers, so the token
    /// travels as a percent-encoded query parameter.
    pub fn stream_url(&self, room_id: &str) -> Result<String> {
        let token = self.credentials.token().ok_or(Error::MissingCredential)?;
        Ok(format!(
            "{}/api/rooms/{}/chat?token={}",
            ws_base(&self.base_url),
            room_id,
            urlencoding::encode(&token)
        ))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("GET {path}");
        let request = self.http.get(self.url(path)).bearer_auth(self.token()?);
        let response = request.send().await?;
        self.handle(response).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("POST {path}");
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(self.token()?)
            .json(body);
        let response = request.send().await?;
        self.handle(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let request = self.http.delete(self.url(path)).bearer_auth(self.token()?);
        let response = request.send().await?;
        self.check_status(&response)?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        debug_assert!(path.starts_with('/'));
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Result<String> {
        self.credentials.token().ok_or(Error::MissingCredential)
    }

    async fn handle<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if let Err(err) = self.check_status(&response) {
            // The error body, when present, carries a more useful detail
            if let Error::Api { status, .. } = err {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::api(status, parse_error_detail(&body)));
            }
            return Err(err);
        }
        Ok(response.json::<T>().await?)
    }

    fn check_status(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.as_u16() == 401 {
            if let Some(handler) = &self.on_unauthorized {
                handler();
            }
            return Err(Error::Unauthorized);
        }
        if status.as_u16() == 403 {
            return Err(Error::Forbidden);
        }
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), status.to_string()));
        }
        Ok(())
    }
}

/// Rewrite an HTTP base into its WebSocket counterpart.
fn ws_base(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https") {
        format!("wss{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http") {
        format!("ws{rest}")
    } else {
        base_url.to_string()
    }
}

/// Pull a human-readable detail out of an error body.
///
/// The backend answers errors as `{"detail": "..."}` (or a structured detail
/// object); anything else falls back to the raw body.
fn parse_error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    fn client_with_token(base: &str, token: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(StaticToken::new(token)))
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client_with_token("http://localhost:8000/", "t");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_ws_base_rewrites_scheme() {
        assert_eq!(ws_base("http://host:8000"), "ws://host:8000");
        assert_eq!(ws_base("https://host"), "wss://host");
    }

    #[test]
    fn test_stream_url_embeds_encoded_token() {
        let client = client_with_token("http://host:8000", "a b+c");
        let url = client.stream_url("room-1").unwrap();
        assert_eq!(url, "ws://host:8000/api/rooms/room-1/chat?token=a%20b%2Bc");
    }

    #[test]
    fn test_stream_url_requires_token() {
        struct NoToken;
        impl CredentialProvider for NoToken {
            fn token(&self) -> Option<String> {
                None
            }
        }
        let client = ApiClient::new("http://host", Arc::new(NoToken));
        assert!(matches!(
            client.stream_url("room-1"),
            Err(Error::MissingCredential)
        ));
    }

    #[test]
    fn test_parse_error_detail_string() {
        assert_eq!(
            parse_error_detail(r#"{"detail":"room not found"}"#),
            "room not found"
        );
    }

    #[test]
    fn test_parse_error_detail_object() {
        assert_eq!(
            parse_error_detail(r#"{"detail":{"field":"title"}}"#),
            r#"{"field":"title"}"#
        );
    }

    #[test]
    fn test_parse_error_detail_plain_body() {
        assert_eq!(parse_error_detail("Bad Gateway"), "Bad Gateway");
    }
}
