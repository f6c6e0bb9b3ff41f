//! OBD-II Protocol Implementation
//!
//! This crate provides the transport seam to a wireless OBD-II adapter and
//! the Mode 01 PID codec that turns hex response frames into physical values.

mod client;
mod error;
mod pid;
mod transport;

pub use client::ObdClient;
pub use error::ObdError;
pub use pid::{decode, DecodedMeasurement, MeasurementKind, POSITIVE_RESPONSE};
pub use transport::{BluetoothLink, ConnectionHandle, LinkConfig, ObdTransport, INVALID_DEVICE};

/// OBD-II mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
}
