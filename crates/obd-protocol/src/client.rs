//! OBD-II Client
//!
//! Pairs a transport with the PID codec: sends the Mode 01 command for a
//! measurement kind and decodes the reply into a physical value.

use crate::error::ObdError;
use crate::pid::{decode, DecodedMeasurement, MeasurementKind};
use crate::transport::{BluetoothLink, ConnectionHandle, ObdTransport};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for OBD commands
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// OBD-II client over any [`ObdTransport`]
pub struct ObdClient<T = BluetoothLink> {
    transport: T,
    /// Command timeout
    timeout: Duration,
}

impl<T: ObdTransport> ObdClient<T> {
    /// Create a new OBD client
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set command timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Open a link to the named adapter
    pub async fn connect(&mut self, device_name: &str) -> Result<ConnectionHandle, ObdError> {
        info!("Connecting to OBD adapter {:?}", device_name);
        self.transport.connect(device_name).await
    }

    /// Close a link; always succeeds
    pub async fn disconnect(&mut self, handle: &ConnectionHandle) {
        self.transport.disconnect(handle).await;
    }

    /// Check whether `handle` is the open link
    pub fn is_connected(&self, handle: &ConnectionHandle) -> bool {
        self.transport.is_active(handle)
    }

    /// Send a raw command and return the adapter's reply uninterpreted
    pub async fn read(&mut self, command: &str) -> Result<String, ObdError> {
        match tokio::time::timeout(self.timeout, self.transport.send_receive(command)).await {
            Ok(reply) => reply,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                warn!("Command {} timed out after {}ms", command, ms);
                Err(ObdError::Timeout(ms))
            }
        }
    }

    /// Query one measurement over the link identified by `handle`
    pub async fn read_measurement(
        &mut self,
        handle: &ConnectionHandle,
        kind: MeasurementKind,
    ) -> Result<DecodedMeasurement, ObdError> {
        if !self.transport.is_active(handle) {
            return Err(ObdError::NotConnected);
        }

        let command = kind.command();
        let response = self.read(&command).await?;
        let measurement = decode(&response, kind)?;
        debug!("{} = {} {}", kind, measurement.value, kind.unit());
        Ok(measurement)
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl Default for ObdClient<BluetoothLink> {
    fn default() -> Self {
        Self::new(BluetoothLink::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Transport that never answers
    struct SilentTransport {
        handle: ConnectionHandle,
    }

    #[async_trait]
    impl ObdTransport for SilentTransport {
        async fn connect(&mut self, _device_name: &str) -> Result<ConnectionHandle, ObdError> {
            Ok(self.handle.clone())
        }

        async fn disconnect(&mut self, _handle: &ConnectionHandle) {}

        async fn send_receive(&mut self, _command: &str) -> Result<String, ObdError> {
            std::future::pending::<Result<String, ObdError>>().await
        }

        fn is_active(&self, handle: &ConnectionHandle) -> bool {
            *handle == self.handle
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_rpm() {
        let mut client = ObdClient::new(BluetoothLink::default());
        let handle = client.connect("OBD-SIM-1").await.unwrap();

        assert_eq!(client.read("010C").await.unwrap(), "41 0C 1A F8");
        let rpm = client
            .read_measurement(&handle, MeasurementKind::EngineRpm)
            .await
            .unwrap();
        assert_eq!(rpm.value, 1726);
    }

    #[tokio::test(start_paused = true)]
    async fn test_canned_measurements() {
        let mut client = ObdClient::new(BluetoothLink::default());
        let handle = client.connect("OBD-SIM-1").await.unwrap();

        let speed = client
            .read_measurement(&handle, MeasurementKind::VehicleSpeed)
            .await
            .unwrap();
        assert_eq!(speed.value, 69);

        let temp = client
            .read_measurement(&handle, MeasurementKind::CoolantTemp)
            .await
            .unwrap();
        assert_eq!(temp.value, 83);

        let fuel = client
            .read_measurement(&handle, MeasurementKind::FuelLevel)
            .await
            .unwrap();
        assert_eq!(fuel.value, 50);

        // Echoed zero-data reply for a PID without a canned value
        let load = client
            .read_measurement(&handle, MeasurementKind::EngineLoad)
            .await
            .unwrap();
        assert_eq!(load.value, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_measurement() {
        let mut client = ObdClient::new(BluetoothLink::default());
        let handle = client.connect("OBD-SIM-1").await.unwrap();
        let err = client
            .read_measurement(&handle, MeasurementKind::Unsupported(0xA6))
            .await
            .unwrap_err();
        assert_eq!(err, ObdError::UnsupportedMeasurement(0xA6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_rejected() {
        let mut client = ObdClient::new(BluetoothLink::default());
        let handle = client.connect("OBD-SIM-1").await.unwrap();
        client.disconnect(&handle).await;
        assert!(!client.is_connected(&handle));

        let err = client
            .read_measurement(&handle, MeasurementKind::EngineRpm)
            .await
            .unwrap_err();
        assert_eq!(err, ObdError::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_timeout() {
        let handle = ConnectionHandle {
            id: "00:00:00:00:00:01".to_string(),
            device_name: "silent".to_string(),
        };
        let mut client = ObdClient::new(SilentTransport {
            handle: handle.clone(),
        });
        client.set_timeout(Duration::from_millis(250));

        let err = client
            .read_measurement(&handle, MeasurementKind::EngineRpm)
            .await
            .unwrap_err();
        assert_eq!(err, ObdError::Timeout(250));
    }
}
