//! Tracking Error Types

use thiserror::Error;

/// Errors raised while acquiring positions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// A single sample did not resolve within the configured timeout
    #[error("Position sample timed out after {0}ms")]
    Timeout(u64),

    /// The position source reported a failure
    #[error("Position source error: {0}")]
    Source(String),

    /// No async runtime available to host the sampling task
    #[error("Tracking runtime unavailable: {0}")]
    Runtime(String),
}
