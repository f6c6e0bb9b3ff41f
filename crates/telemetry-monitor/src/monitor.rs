//! Vehicle Telemetry Monitor
//!
//! Owns one adapter link and one position tracker for a single vehicle and
//! merges both into [`VehicleSnapshot`]s on demand.

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::snapshot::{DiagnosticsRecord, VehicleSnapshot};
use chrono::Utc;
use geo_tracking::{GeoPosition, PositionTracker};
use obd_protocol::{BluetoothLink, ConnectionHandle, MeasurementKind, ObdClient, ObdTransport};
use tracing::{debug, info, warn};

/// Telemetry monitor for one vehicle
pub struct VehicleMonitor<T = BluetoothLink> {
    client: ObdClient<T>,
    tracker: PositionTracker,
    connection: Option<ConnectionHandle>,
}

impl VehicleMonitor<BluetoothLink> {
    /// Monitor over the simulated adapter link
    pub fn new(config: &MonitorConfig) -> Self {
        let mut client = ObdClient::new(BluetoothLink::new(config.link.clone()));
        client.set_timeout(config.command_timeout());
        Self::with_parts(client, PositionTracker::new(config.tracker.clone()))
    }
}

impl<T: ObdTransport> VehicleMonitor<T> {
    /// Assemble a monitor from pre-built components
    pub fn with_parts(client: ObdClient<T>, tracker: PositionTracker) -> Self {
        Self {
            client,
            tracker,
            connection: None,
        }
    }

    /// Connect to the vehicle's adapter, replacing any existing link
    pub async fn initialize(&mut self, device_name: &str) -> Result<ConnectionHandle, MonitorError> {
        if let Some(previous) = self.connection.take() {
            self.client.disconnect(&previous).await;
        }

        let handle = self.client.connect(device_name).await.map_err(|e| {
            MonitorError::Connection(format!("failed to connect to {:?}: {}", device_name, e))
        })?;

        info!("Monitor initialized on {}", handle.device_name);
        self.connection = Some(handle.clone());
        Ok(handle)
    }

    /// Active adapter link
    pub fn connection(&self) -> Option<&ConnectionHandle> {
        self.connection.as_ref()
    }

    pub fn client_mut(&mut self) -> &mut ObdClient<T> {
        &mut self.client
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Capture position and diagnostics concurrently.
    ///
    /// Either half may be missing; the snapshot is still returned.
    pub async fn get_vehicle_data(&mut self, vehicle_id: &str) -> VehicleSnapshot {
        let Self {
            client,
            tracker,
            connection,
        } = self;

        let (location, diagnostics) = tokio::join!(
            sample_location(tracker),
            sample_diagnostics(client, connection.as_ref()),
        );

        let snapshot = VehicleSnapshot {
            vehicle_id: vehicle_id.to_string(),
            timestamp: Utc::now(),
            location,
            diagnostics,
        };
        if !snapshot.is_complete() {
            warn!(
                "Partial snapshot for {} (location: {}, diagnostics: {})",
                vehicle_id,
                snapshot.location.is_some(),
                snapshot.diagnostics.is_some()
            );
        }
        snapshot
    }

    /// Single position query
    pub async fn get_current_position(&self) -> Result<GeoPosition, MonitorError> {
        self.tracker
            .get_current_position()
            .await
            .map_err(|e| MonitorError::Tracking(e.to_string()))
    }

    /// Start continuous position sampling; returns whether tracking is active
    pub fn start_tracking<F>(&self, on_sample: F) -> Result<bool, MonitorError>
    where
        F: Fn(GeoPosition) + Send + Sync + 'static,
    {
        self.tracker
            .start_tracking(on_sample)
            .map_err(|e| MonitorError::Tracking(e.to_string()))?;
        Ok(self.tracker.is_tracking())
    }

    pub fn stop_tracking(&self) {
        self.tracker.stop_tracking();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_tracking()
    }

    pub fn last_known_position(&self) -> Option<GeoPosition> {
        self.tracker.get_last_known_position()
    }

    /// Stop tracking and drop the adapter link
    pub async fn shutdown(&mut self) {
        self.tracker.stop_tracking();
        if let Some(handle) = self.connection.take() {
            self.client.disconnect(&handle).await;
        }
        info!("Monitor shut down");
    }
}

async fn sample_location(tracker: &PositionTracker) -> Option<GeoPosition> {
    match tracker.get_current_position().await {
        Ok(position) => Some(position),
        Err(e) => {
            warn!("Position unavailable: {}", e);
            None
        }
    }
}

async fn sample_diagnostics<T: ObdTransport>(
    client: &mut ObdClient<T>,
    handle: Option<&ConnectionHandle>,
) -> Option<DiagnosticsRecord> {
    let Some(handle) = handle else {
        debug!("No adapter link, skipping diagnostics");
        return None;
    };

    let record = DiagnosticsRecord {
        engine_rpm: read_value(client, handle, MeasurementKind::EngineRpm).await,
        vehicle_speed: read_value(client, handle, MeasurementKind::VehicleSpeed).await,
        engine_temp: read_value(client, handle, MeasurementKind::CoolantTemp).await,
        fuel_level: read_value(client, handle, MeasurementKind::FuelLevel).await,
    };
    (!record.is_empty()).then_some(record)
}

async fn read_value<T: ObdTransport>(
    client: &mut ObdClient<T>,
    handle: &ConnectionHandle,
    kind: MeasurementKind,
) -> Option<i32> {
    match client.read_measurement(handle, kind).await {
        Ok(measurement) => Some(measurement.value),
        Err(e) => {
            warn!("Failed to read {}: {}", kind, e);
            None
        }
    }
}
