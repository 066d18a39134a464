//! Request loop orchestration
//!
//! The runner replays one [`RequestSpec`] strictly sequentially:
//!
//! 1. **Iteration**: `loops` passes; a POST pass sends every payload in order,
//!    any other method sends one request per pass
//! 2. **Authorization**: a known access token is sent as a bearer header
//! 3. **Refresh**: a 401 with a token attached triggers one refresh and
//!    exactly one resend; the second response is final
//! 4. **Capture**: responses are collected (when enabled) and run through
//!    every [`Condition`](crate::condition::Condition)
//! 5. **Persistence**: collected bodies are written once the run ends
//!
//! # Error Handling
//!
//! A dispatch yields `Result<HttpResponse, DispatchError>`. Errors are logged
//! and the run moves on; the dispatch still counts toward progress. File write
//! failures are logged per file. [`RequestRunner::run`] itself cannot fail.
//!
//! # Example
//!
//! ```no_run
//! use reqloop::runner::{RequestRunner, RequestSpec, RunSettings};
//! use reqloop::transport::ReqwestTransport;
//! use reqwest::Method;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = RequestSpec::new(Method::GET, "https://api.example.com/health");
//! let settings = RunSettings { loops: 10, ..RunSettings::default() };
//! let mut runner = RequestRunner::new(spec, settings, Arc::new(ReqwestTransport::new()?));
//! runner.run().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod progress;
pub mod request;

pub use config::{OutputConfig, RunSettings};
pub use executor::RequestRunner;
pub use progress::RunProgress;
pub use request::{BodyEncoding, RequestSpec};

use crate::token::TokenRefreshError;
use crate::transport::TransportError;

/// Why a single dispatch produced no response
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Request could not be sent or answered
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Token refresh after a 401 failed
    #[error("token refresh error: {0}")]
    TokenRefresh(#[from] TokenRefreshError),
}

/// Result of one dispatch
pub type DispatchResult<T> = Result<T, DispatchError>;
