//! OAuth2 access token management
//!
//! A [`Token`] starts unauthenticated (empty access token) and becomes
//! authenticated through [`Token::refresh_access_token`], which performs the
//! `refresh_token` grant against the token endpoint. Fields of the token
//! response are located with caller-supplied key paths, see [`extract_value`].
//!
//! The token is owned by the caller. Runners hold a [`SharedToken`] handle so
//! several runners can use one token; refreshing happens under its lock.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::runner::config::{DEFAULT_ACCESS_TOKEN_PATH, DEFAULT_REFRESH_TOKEN_PATH};
use crate::sink::LogSink;
use crate::transport::{Headers, HttpRequest, HttpTransport, Payload, RequestBody, TransportError};

/// Token refresh errors
#[derive(Debug, thiserror::Error)]
pub enum TokenRefreshError {
    /// Token endpoint could not be reached
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] TransportError),

    /// Token endpoint answered with a status other than 200
    #[error("token refresh failed with status code {0}")]
    UnexpectedStatus(u16),

    /// Token endpoint answered 200 with a body that is not JSON
    #[error("token response is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenRefreshError>;

/// Token handle shared between the caller and any number of runners
pub type SharedToken = Arc<Mutex<Token>>;

/// OAuth2 client credentials plus the current access/refresh token pair
#[derive(Debug, Clone)]
pub struct Token {
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    access_token: String,
    access_token_path: Vec<String>,
    refresh_token_path: Vec<String>,
}

impl Token {
    /// Create an unauthenticated token with the default response paths
    pub fn new(
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            access_token: String::new(),
            access_token_path: vec![DEFAULT_ACCESS_TOKEN_PATH.to_string()],
            refresh_token_path: vec![DEFAULT_REFRESH_TOKEN_PATH.to_string()],
        }
    }

    /// Key path of the access token inside the token response
    pub fn with_access_token_path(mut self, path: Vec<String>) -> Self {
        self.access_token_path = path;
        self
    }

    /// Key path of the refresh token inside the token response
    pub fn with_refresh_token_path(mut self, path: Vec<String>) -> Self {
        self.refresh_token_path = path;
        self
    }

    /// Start out authenticated with a known access token
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self
    }

    /// Wrap into a [`SharedToken`]
    pub fn shared(self) -> SharedToken {
        Arc::new(Mutex::new(self))
    }

    /// Token endpoint URL
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Current access token, empty until the first refresh
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Whether an access token is present
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// `Bearer <access_token>`
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn grant_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("grant_type".into(), Value::from("refresh_token"));
        payload.insert("refresh_token".into(), Value::from(self.refresh_token.as_str()));
        payload.insert("client_id".into(), Value::from(self.client_id.as_str()));
        payload.insert("client_secret".into(), Value::from(self.client_secret.as_str()));
        payload
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// The request always verifies TLS, whatever the runner is configured
    /// with. On failure the token is left untouched. On a 200 response the
    /// access token is replaced by whatever the access token path yields,
    /// which is the empty string when the path does not resolve to a string.
    /// The refresh token is only replaced by a non-empty value.
    pub async fn refresh_access_token(
        &mut self,
        transport: &dyn HttpTransport,
        headers: &Headers,
        sink: &dyn LogSink,
    ) -> TokenResult<String> {
        let request = HttpRequest::new(Method::POST, self.token_endpoint.clone())
            .with_headers(headers.clone())
            .with_body(RequestBody::Form(self.grant_payload()))
            .with_verify_tls(true);

        let response = match transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                let err = TokenRefreshError::from(e);
                sink.error(&format!("Error refreshing token: {err}"));
                return Err(err);
            }
        };

        if response.status != 200 {
            sink.error(&format!(
                "Token refresh failed with status code {}",
                response.status
            ));
            return Err(TokenRefreshError::UnexpectedStatus(response.status));
        }

        let data: Value = match serde_json::from_str(&response.body) {
            Ok(data) => data,
            Err(e) => {
                let err = TokenRefreshError::InvalidJson(e.to_string());
                sink.error(&format!("Error refreshing token: {err}"));
                return Err(err);
            }
        };

        self.access_token = extract_value(&data, self.access_token_path.as_slice())
            .unwrap_or_default()
            .to_string();

        if let Some(refresh) = extract_value(&data, self.refresh_token_path.as_slice()) {
            if !refresh.is_empty() {
                self.refresh_token = refresh.to_string();
            }
        }

        Ok(self.access_token.clone())
    }
}

/// Follow `path` through nested JSON objects and return the string found there.
///
/// Returns `None` when a key is missing, an intermediate value is not an
/// object, or the final value is not a string.
pub fn extract_value<'a, S: AsRef<str>>(data: &'a Value, path: &[S]) -> Option<&'a str> {
    let mut current = data;
    for key in path {
        current = current.as_object()?.get(key.as_ref())?;
    }
    current.as_str()
}
