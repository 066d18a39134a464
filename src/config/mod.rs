//! Run configuration file
//!
//! A run is described by a JSON document whose fields mirror the runner's
//! construction parameters. Missing optional fields take the same defaults
//! as the library API. [`RunConfig::validate`] catches bad values before any
//! request is built.
//!
//! ```json
//! {
//!   "method": "POST",
//!   "url": "https://api.example.com/orders",
//!   "headers": {"Accept": "application/json"},
//!   "payloads": [{"sku": "A-1"}, {"sku": "B-2"}],
//!   "loops": 3,
//!   "sleep_time": 0.5,
//!   "save_output": true,
//!   "conditions": [
//!     {"status_codes": [500, 503], "output_file": "errors.txt"}
//!   ],
//!   "token": {
//!     "token_endpoint": "https://auth.example.com/oauth/token",
//!     "client_id": "replay",
//!     "client_secret": "s3cret",
//!     "refresh_token": "r-123",
//!     "access_token_path": ["data", "access_token"]
//!   }
//! }
//! ```

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::condition::Condition;
use crate::runner::config::{
    sleep_duration, DEFAULT_ACCESS_TOKEN_PATH, DEFAULT_LOOPS, DEFAULT_OUTPUT_FILE,
    DEFAULT_REFRESH_TOKEN_PATH,
};
use crate::runner::{BodyEncoding, OutputConfig, RequestSpec, RunProgress, RunSettings};
use crate::token::Token;
use crate::transport::{Headers, Payload};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid run configuration
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field has an unusable value
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

fn default_loops() -> u32 {
    DEFAULT_LOOPS
}

fn default_true() -> bool {
    true
}

fn default_access_token_path() -> Vec<String> {
    vec![DEFAULT_ACCESS_TOKEN_PATH.to_string()]
}

fn default_refresh_token_path() -> Vec<String> {
    vec![DEFAULT_REFRESH_TOKEN_PATH.to_string()]
}

/// OAuth2 refresh settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token endpoint URL
    pub token_endpoint: String,
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Refresh token to start from
    pub refresh_token: String,
    /// Access token to start from; empty means unauthenticated
    #[serde(default)]
    pub access_token: String,
    /// Key path of the access token in the token response
    #[serde(default = "default_access_token_path")]
    pub access_token_path: Vec<String>,
    /// Key path of the refresh token in the token response
    #[serde(default = "default_refresh_token_path")]
    pub refresh_token_path: Vec<String>,
}

impl TokenConfig {
    /// Build the token
    pub fn to_token(&self) -> Token {
        Token::new(
            self.token_endpoint.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.refresh_token.clone(),
        )
        .with_access_token(self.access_token.clone())
        .with_access_token_path(self.access_token_path.clone())
        .with_refresh_token_path(self.refresh_token_path.clone())
    }
}

/// Complete description of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// HTTP method (case-insensitive)
    pub method: String,
    /// Target URL
    pub url: String,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// POST payloads; absent or empty means one empty payload
    #[serde(default)]
    pub payloads: Vec<Payload>,
    /// GET query parameters
    #[serde(default)]
    pub params: Option<Payload>,
    /// OAuth2 refresh settings
    #[serde(default)]
    pub token: Option<TokenConfig>,
    /// Collect every response body into `output_file`
    #[serde(default)]
    pub save_output: bool,
    /// File for all collected responses
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// Match conditions
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Seconds to pause after each request
    #[serde(default)]
    pub sleep_time: f64,
    /// Verify TLS certificates of the target
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    /// Number of passes
    #[serde(default = "default_loops")]
    pub loops: u32,
    /// Append to existing output files
    #[serde(default)]
    pub append_logs: bool,
    /// POST body encoding
    #[serde(default)]
    pub body_encoding: BodyEncoding,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

impl RunConfig {
    /// Minimal configuration with every default applied
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            payloads: Vec::new(),
            params: None,
            token: None,
            save_output: false,
            output_file: default_output_file(),
            conditions: Vec::new(),
            sleep_time: 0.0,
            verify_ssl: true,
            loops: DEFAULT_LOOPS,
            append_logs: false,
            body_encoding: BodyEncoding::default(),
            timeout_secs: None,
        }
    }

    /// Load and parse a JSON file (not validated)
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string (not validated)
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parsed, upper-cased HTTP method
    pub fn http_method(&self) -> ConfigResult<Method> {
        let upper = self.method.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Err(ConfigError::Invalid("method must not be empty".to_string()));
        }
        Method::from_bytes(upper.as_bytes())
            .map_err(|_| ConfigError::Invalid(format!("invalid HTTP method: {}", self.method)))
    }

    /// Reject values the runner cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        self.http_method()?;

        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "url must start with http:// or https://: {url}"
            )));
        }

        if self.loops < 1 {
            return Err(ConfigError::Invalid("loops must be at least 1".to_string()));
        }

        if !self.sleep_time.is_finite() || self.sleep_time < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sleep_time must be a non-negative number of seconds, got {}",
                self.sleep_time
            )));
        }
        if Duration::try_from_secs_f64(self.sleep_time).is_err() {
            return Err(ConfigError::Invalid(format!(
                "sleep_time too large: {}",
                self.sleep_time
            )));
        }

        if let Some(timeout) = self.timeout_secs {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "timeout_secs must be positive, got {timeout}"
                )));
            }
        }
        self.timeout()?;

        for (index, condition) in self.conditions.iter().enumerate() {
            if condition.output_file.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "condition {index} has an empty output_file"
                )));
            }
        }

        if let Some(token) = &self.token {
            if token.token_endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "token.token_endpoint must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Request spec for the runner
    pub fn request_spec(&self) -> ConfigResult<RequestSpec> {
        Ok(RequestSpec::new(self.http_method()?, self.url.trim())
            .with_headers(self.headers.clone())
            .with_payloads(self.payloads.clone())
            .with_params(self.params.clone())
            .with_body_encoding(self.body_encoding))
    }

    /// Run settings for the runner
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            output: OutputConfig {
                save_output: self.save_output,
                output_file: self.output_file.clone(),
                append: self.append_logs,
            },
            conditions: self.conditions.clone(),
            sleep_time: sleep_duration(self.sleep_time),
            loops: self.loops,
            verify_tls: self.verify_ssl,
        }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> ConfigResult<Option<Duration>> {
        self.timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| ConfigError::Invalid(format!("timeout_secs too large: {secs}")))
            })
            .transpose()
    }

    /// Dispatches the run will make
    pub fn total_requests(&self) -> ConfigResult<u64> {
        let payload_count = self.payloads.len().max(1);
        Ok(RunProgress::total_for(
            self.http_method()? == Method::POST,
            payload_count,
            self.loops,
        ))
    }
}
