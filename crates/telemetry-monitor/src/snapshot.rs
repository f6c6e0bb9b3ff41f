//! Unified telemetry records

use chrono::{DateTime, Utc};
use geo_tracking::GeoPosition;
use serde::{Deserialize, Serialize};

/// Diagnostic half of a snapshot; each field is absent if its read failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsRecord {
    /// Engine speed (rpm)
    pub engine_rpm: Option<i32>,
    /// Vehicle speed (km/h)
    pub vehicle_speed: Option<i32>,
    /// Coolant temperature (°C)
    pub engine_temp: Option<i32>,
    /// Fuel tank level (%)
    pub fuel_level: Option<i32>,
}

impl DiagnosticsRecord {
    /// True when no measurement was obtained
    pub fn is_empty(&self) -> bool {
        self.engine_rpm.is_none()
            && self.vehicle_speed.is_none()
            && self.engine_temp.is_none()
            && self.fuel_level.is_none()
    }
}

/// One vehicle's combined telemetry at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Option<GeoPosition>,
    pub diagnostics: Option<DiagnosticsRecord>,
}

impl VehicleSnapshot {
    /// Both halves present
    pub fn is_complete(&self) -> bool {
        self.location.is_some() && self.diagnostics.is_some()
    }
}
