//! HTTP transport adapter
//!
//! A single request/response exchange, with no retries and no interpretation
//! of status codes. Anything that prevents a response from arriving (DNS,
//! refused connection, timeout, TLS) is a [`TransportError`], never an
//! [`HttpResponse`].

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

pub mod reqwest_client;

pub use reqwest_client::ReqwestTransport;

/// Header name to value mapping
pub type Headers = BTreeMap<String, String>;

/// JSON object used for payloads and query parameters
pub type Payload = serde_json::Map<String, Value>;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established (DNS, refused, TLS handshake)
    #[error("connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other failure while sending or reading the response
    #[error("request error: {0}")]
    Request(String),

    /// Request could not be built (bad header, method or URL)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying HTTP client could not be constructed
    #[error("client setup error: {0}")]
    Setup(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Request body variants
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Payload),
    /// `application/json`
    Json(Payload),
}

/// One outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Headers sent verbatim
    pub headers: Headers,
    /// Optional body
    pub body: Option<RequestBody>,
    /// Optional query parameters
    pub query: Option<Payload>,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
}

impl HttpRequest {
    /// Create a request with no body, no query and TLS verification on
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            query: None,
            verify_tls: true,
        }
    }

    /// Replace the headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a body
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach query parameters
    pub fn with_query(mut self, query: Payload) -> Self {
        self.query = Some(query);
        self
    }

    /// Toggle TLS certificate verification
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }
}

/// One received response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Numeric status code
    pub status: u16,
    /// Body decoded as text
    pub body: String,
    /// Response headers (lowercase names)
    pub headers: Headers,
}

impl HttpResponse {
    /// Build a response with no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Headers::new(),
        }
    }
}

/// Sends exactly one request and returns exactly one response or error
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request
    async fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse>;
}

/// Flatten a payload into urlencoded key/value pairs.
///
/// Strings are sent as-is, `null` entries are dropped, arrays repeat the key
/// once per element, and every other value is sent as its JSON text.
pub fn encode_pairs(payload: &Payload) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(payload.len());
    for (key, value) in payload {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
