//! The request being replayed

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::transport::{Headers, HttpRequest, Payload, RequestBody};

use super::config::AUTHORIZATION_HEADER;

/// How POST payloads are put on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `application/json`
    Json,
}

/// Method, URL, headers, payloads and query parameters of the replayed request.
///
/// Only the headers change during a run (the `Authorization` header).
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: Headers,
    payloads: Vec<Payload>,
    params: Option<Payload>,
    body_encoding: BodyEncoding,
}

impl RequestSpec {
    /// Request with no headers, a single empty payload and no params
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            payloads: vec![Payload::new()],
            params: None,
            body_encoding: BodyEncoding::default(),
        }
    }

    /// Set the headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the payloads; an empty list means one empty payload
    pub fn with_payloads(mut self, payloads: Vec<Payload>) -> Self {
        self.payloads = if payloads.is_empty() {
            vec![Payload::new()]
        } else {
            payloads
        };
        self
    }

    /// Set the query parameters (sent with GET only)
    pub fn with_params(mut self, params: Option<Payload>) -> Self {
        self.params = params;
        self
    }

    /// Set the POST body encoding
    pub fn with_body_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.body_encoding = encoding;
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Payloads, in dispatch order
    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    /// Whether payloads are sent (one dispatch per payload per loop)
    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// Set `Authorization`, replacing any existing value regardless of header case
    pub fn set_authorization(&mut self, value: String) {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        self.headers.insert(AUTHORIZATION_HEADER.to_string(), value);
    }

    /// Build the wire request: POST carries the payload, GET carries the params
    pub fn build(&self, payload: &Payload, verify_tls: bool) -> HttpRequest {
        let mut request = HttpRequest::new(self.method.clone(), self.url.clone())
            .with_headers(self.headers.clone())
            .with_verify_tls(verify_tls);

        if self.method == Method::POST {
            let body = match self.body_encoding {
                BodyEncoding::Form => RequestBody::Form(payload.clone()),
                BodyEncoding::Json => RequestBody::Json(payload.clone()),
            };
            request = request.with_body(body);
        } else if self.method == Method::GET {
            if let Some(params) = &self.params {
                request = request.with_query(params.clone());
            }
        }

        request
    }
}
