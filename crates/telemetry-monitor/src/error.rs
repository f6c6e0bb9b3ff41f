//! Monitor Error Types

use thiserror::Error;

/// Errors surfaced to the dashboard layer
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Adapter link could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Position tracking could not be started or queried
    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
