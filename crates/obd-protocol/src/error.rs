//! OBD-II Error Types

use thiserror::Error;

/// Errors that can occur while talking to an OBD-II adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObdError {
    /// Connect target is empty, unknown, or the reserved invalid device
    #[error("OBD adapter not found: {0:?}")]
    DeviceNotFound(String),

    /// Response frame does not have the minimum positive-response shape
    #[error("Malformed OBD frame: {0:?}")]
    MalformedFrame(String),

    /// No decoding formula is known for this PID
    #[error("Unsupported measurement: PID {0:02X}")]
    UnsupportedMeasurement(u8),

    /// No active link, or the handle does not belong to the active link
    #[error("OBD adapter is not connected")]
    NotConnected,

    /// Timeout waiting for response
    #[error("Timeout waiting for OBD response after {0}ms")]
    Timeout(u64),
}
