//! # reqloop
//!
//! Replays HTTP requests against a single endpoint, strictly one at a time,
//! for load-testing or polling. Responses can be collected to a file and
//! filtered into per-condition files. A 401 triggers an OAuth2
//! `refresh_token` grant and a single resend.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reqloop::condition::Condition;
//! use reqloop::runner::{OutputConfig, RequestRunner, RequestSpec, RunSettings};
//! use reqloop::token::Token;
//! use reqloop::transport::ReqwestTransport;
//! use reqwest::Method;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = Token::new(
//!     "https://auth.example.com/oauth/token",
//!     "client-id",
//!     "client-secret",
//!     "refresh-token",
//! )
//! .shared();
//!
//! let spec = RequestSpec::new(Method::GET, "https://api.example.com/status");
//! let settings = RunSettings {
//!     loops: 100,
//!     output: OutputConfig { save_output: true, ..OutputConfig::default() },
//!     conditions: vec![Condition::new("errors.txt").with_status_codes([500, 503])],
//!     ..RunSettings::default()
//! };
//!
//! let mut runner = RequestRunner::new(spec, settings, Arc::new(ReqwestTransport::new()?))
//!     .with_token(token.clone());
//! runner.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`transport`] - One request, one response or a transport error
//! - [`token`] - Access/refresh token state and the refresh grant
//! - [`condition`] - Status/body match rules and captured bodies
//! - [`runner`] - The request loop, 401 retry, progress and persistence
//! - [`output`] - Line-per-body output files
//! - [`config`] - JSON run configuration
//! - [`sink`] - Log sinks injected into the runner

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Match conditions
pub mod condition;

/// Run configuration file
pub mod config;

/// Output file writers
pub mod output;

/// Request loop orchestration
pub mod runner;

/// Log sinks
pub mod sink;

/// OAuth2 token management
pub mod token;

/// HTTP transport adapter
pub mod transport;

pub use condition::{Condition, ConditionResult};
pub use config::RunConfig;
pub use runner::{RequestRunner, RequestSpec, RunSettings};
pub use token::{SharedToken, Token};
