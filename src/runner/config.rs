//! Runner configuration constants and settings

use std::path::PathBuf;
use std::time::Duration;

use crate::condition::Condition;

/// Default file for all collected responses
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Default key of the access token in a token response
pub const DEFAULT_ACCESS_TOKEN_PATH: &str = "access_token";

/// Default key of the refresh token in a token response
pub const DEFAULT_REFRESH_TOKEN_PATH: &str = "refresh_token";

/// Header carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Status code that triggers a token refresh and a single retry
pub const UNAUTHORIZED: u16 = 401;

/// Default number of passes over the payloads
pub const DEFAULT_LOOPS: u32 = 1;

/// Convert a sleep time in seconds into a [`Duration`].
///
/// Negative, NaN and infinite inputs give a zero duration. Values past
/// [`Duration::MAX`] saturate.
pub fn sleep_duration(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Where collected responses go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Collect every response body and write them at the end of the run
    pub save_output: bool,
    /// File for all collected responses
    pub output_file: PathBuf,
    /// Append to existing files instead of overwriting them
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_output: false,
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            append: false,
        }
    }
}

/// Everything about a run except the request itself
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Output collection
    pub output: OutputConfig,
    /// Match conditions, each with its own output file
    pub conditions: Vec<Condition>,
    /// Pause after every dispatch
    pub sleep_time: Duration,
    /// Number of passes
    pub loops: u32,
    /// Verify TLS certificates of the target endpoint
    pub verify_tls: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            conditions: Vec::new(),
            sleep_time: Duration::ZERO,
            loops: DEFAULT_LOOPS,
            verify_tls: true,
        }
    }
}
