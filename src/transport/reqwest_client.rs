//! [`HttpTransport`] backed by `reqwest`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{
    encode_pairs, Headers, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError,
    TransportResult,
};

/// reqwest-backed transport.
///
/// TLS verification is a client-level setting in reqwest, so two clients are
/// kept and picked per request from [`HttpRequest::verify_tls`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    verified: Client,
    unverified: Client,
}

impl ReqwestTransport {
    /// Create a transport without a request timeout
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(None)
    }

    /// Create a transport with an optional per-request timeout
    pub fn with_timeout(timeout: Option<Duration>) -> TransportResult<Self> {
        Ok(Self {
            verified: build_client(timeout, false)?,
            unverified: build_client(timeout, true)?,
        })
    }

    fn client_for(&self, verify_tls: bool) -> &Client {
        if verify_tls {
            &self.verified
        } else {
            &self.unverified
        }
    }
}

fn build_client(timeout: Option<Duration>, accept_invalid_certs: bool) -> TransportResult<Client> {
    let mut builder = Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TransportError::Setup(e.to_string()))
}

fn to_header_map(headers: &Headers) -> TransportResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header value for '{name}': {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn from_header_map(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse> {
        let mut builder = self
            .client_for(request.verify_tls)
            .request(request.method.clone(), &request.url)
            .headers(to_header_map(&request.headers)?);

        if let Some(query) = &request.query {
            builder = builder.query(&encode_pairs(query));
        }

        builder = match &request.body {
            Some(RequestBody::Form(payload)) => builder.form(&encode_pairs(payload)),
            Some(RequestBody::Json(payload)) => builder.json(payload),
            None => builder,
        };

        debug!(method = %request.method, url = %request.url, "sending request");

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = from_header_map(response.headers());
        let body = response.text().await.map_err(classify)?;

        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}
