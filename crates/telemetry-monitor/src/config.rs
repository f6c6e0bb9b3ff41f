//! Monitor configuration

use crate::error::MonitorError;
use geo_tracking::TrackerConfig;
use obd_protocol::LinkConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment prefix for overrides, e.g. `TELEMETRY__TRACKER__TIMEOUT_MS`
const ENV_PREFIX: &str = "TELEMETRY";

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Adapter to pair with
    pub device_name: String,

    /// Vehicle the snapshots are attributed to
    pub vehicle_id: String,

    /// Snapshot period used by the daemon (milliseconds)
    pub snapshot_interval_ms: u64,

    /// OBD-II command timeout (milliseconds)
    pub command_timeout_ms: u64,

    pub link: LinkConfig,

    pub tracker: TrackerConfig,
}

impl MonitorConfig {
    /// Load from an optional file (any format the `config` crate detects by
    /// extension) layered under `TELEMETRY__*` environment variables
    pub fn load(path: &str) -> Result<Self, MonitorError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_name: "OBD-SIM-1".to_string(),
            vehicle_id: "vehicle-1".to_string(),
            snapshot_interval_ms: 5000,
            command_timeout_ms: 2000,
            link: LinkConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}
