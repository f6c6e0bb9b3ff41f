//! Position samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw reading from a position source, before it is timestamped
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fix {
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Horizontal accuracy (meters)
    pub accuracy: Option<f64>,
    /// Altitude (meters)
    pub altitude: Option<f64>,
    /// Heading (degrees from true north)
    pub heading: Option<f64>,
    /// Ground speed (m/s)
    pub speed: Option<f64>,
}

/// One timestamped location sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl GeoPosition {
    /// Position with coordinates only
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self::from_fix(
            Fix {
                latitude,
                longitude,
                ..Default::default()
            },
            timestamp,
        )
    }

    /// Stamp a raw fix with its capture time
    pub fn from_fix(fix: Fix, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp,
            accuracy: fix.accuracy,
            altitude: fix.altitude,
            heading: fix.heading,
            speed: fix.speed,
        }
    }

    /// Great-circle distance to `other` in kilometers
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        crate::distance::distance_km(self, other)
    }
}
