//! CLI error types and conversions

use crate::config::ConfigError;
use crate::transport::TransportError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// HTTP client could not be set up
    #[error("transport error: {0}")]
    TransportError(#[from] TransportError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
