//! Wireless Link to an OBD-II Adapter
//!
//! [`ObdTransport`] is the seam between the codec and the radio. It knows how to
//! open and close a link and how to exchange one textual command for one
//! textual reply; it has no protocol knowledge beyond that.
//!
//! [`BluetoothLink`] is the simulated adapter. It never pairs with real
//! hardware and answers a fixed set of commands with canned frames so the
//! codec and everything above it can be tested deterministically.

use crate::error::ObdError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, info};

/// Device name reserved for exercising the not-found path
pub const INVALID_DEVICE: &str = "INVALID-DEVICE";

/// One established link to an adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle {
    /// Opaque identifier (MAC-style for the simulated link)
    pub id: String,
    /// Human-readable device name the link was opened with
    pub device_name: String,
}

/// Transport abstraction beneath the OBD codec
#[async_trait]
pub trait ObdTransport: Send + Sync {
    /// Open a link to the named adapter
    async fn connect(&mut self, device_name: &str) -> Result<ConnectionHandle, ObdError>;

    /// Close a link. Unknown or already-closed handles are ignored.
    async fn disconnect(&mut self, handle: &ConnectionHandle);

    /// Send one command and wait for the adapter's reply
    async fn send_receive(&mut self, command: &str) -> Result<String, ObdError>;

    /// Whether `handle` is the currently open link
    fn is_active(&self, handle: &ConnectionHandle) -> bool;
}

/// Simulated link timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Pairing delay in milliseconds
    pub connect_latency_ms: u64,
    /// Round-trip delay per command in milliseconds
    pub response_latency_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_latency_ms: 100,
            response_latency_ms: 20,
        }
    }
}

/// Simulated short-range wireless link to a single adapter
#[derive(Debug, Default)]
pub struct BluetoothLink {
    config: LinkConfig,
    active: Option<ConnectionHandle>,
}

impl BluetoothLink {
    /// Create a disconnected link
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Currently open handle, if any
    pub fn active(&self) -> Option<&ConnectionHandle> {
        self.active.as_ref()
    }

    /// Reply the simulated adapter gives for a normalized command
    fn canned_reply(command: &str) -> String {
        match command {
            "010C" => "41 0C 1A F8".to_string(),
            "010D" => "41 0D 45".to_string(),
            "0105" => "41 05 7B".to_string(),
            "012F" => "41 2F 80".to_string(),
            other => format!("41 {} 00", other.get(2..).unwrap_or("")),
        }
    }
}

/// Derive a MAC-style id from a device name.
///
/// Stable for a given build; `DefaultHasher` output may change between Rust
/// releases, so ids must not be persisted.
fn handle_id(device_name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    device_name.hash(&mut hasher);
    let bytes = hasher.finish().to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[async_trait]
impl ObdTransport for BluetoothLink {
    async fn connect(&mut self, device_name: &str) -> Result<ConnectionHandle, ObdError> {
        if device_name.is_empty() || device_name == INVALID_DEVICE {
            return Err(ObdError::DeviceNotFound(device_name.to_string()));
        }

        if let Some(previous) = self.active.take() {
            info!("Closing link to {} before reconnecting", previous.device_name);
        }

        tokio::time::sleep(Duration::from_millis(self.config.connect_latency_ms)).await;

        let handle = ConnectionHandle {
            id: handle_id(device_name),
            device_name: device_name.to_string(),
        };
        info!("Connected to OBD adapter {} ({})", handle.device_name, handle.id);
        self.active = Some(handle.clone());
        Ok(handle)
    }

    async fn disconnect(&mut self, handle: &ConnectionHandle) {
        if self.is_active(handle) {
            info!("Disconnecting OBD adapter {}", handle.device_name);
            self.active = None;
        } else {
            debug!("Ignoring disconnect for inactive handle {}", handle.id);
        }
    }

    async fn send_receive(&mut self, command: &str) -> Result<String, ObdError> {
        if self.active.is_none() {
            return Err(ObdError::NotConnected);
        }

        let command = command.trim().to_ascii_uppercase();
        tokio::time::sleep(Duration::from_millis(self.config.response_latency_ms)).await;

        let reply = Self::canned_reply(&command);
        debug!("{} -> {}", command, reply);
        Ok(reply)
    }

    fn is_active(&self, handle: &ConnectionHandle) -> bool {
        self.active.as_ref() == Some(handle)
    }
}
