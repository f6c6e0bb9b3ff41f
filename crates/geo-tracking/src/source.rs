//! Position sources
//!
//! [`PositionSource`] stands in for the platform positioning provider. The
//! simulated source jitters around a fixed reference coordinate.

use crate::error::TrackingError;
use crate::position::Fix;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Reference latitude of the simulated source
pub const REFERENCE_LATITUDE: f64 = 40.7128;
/// Reference longitude of the simulated source
pub const REFERENCE_LONGITUDE: f64 = -74.0060;

/// Maximum simulated offset from the reference coordinate (degrees)
const MAX_JITTER_DEG: f64 = 0.001;

/// Something that can be asked for the current position
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Acquire one fix. `high_accuracy` selects the provider's precise mode.
    async fn acquire(&self, high_accuracy: bool) -> Result<Fix, TrackingError>;
}

/// Pseudo-random positions around a reference coordinate
#[derive(Debug)]
pub struct SimulatedSource {
    latitude: f64,
    longitude: f64,
    latency: Duration,
    counter: AtomicU64,
}

impl SimulatedSource {
    /// Simulated source with the given acquisition latency
    pub fn new(latency: Duration) -> Self {
        Self::around(REFERENCE_LATITUDE, REFERENCE_LONGITUDE, latency)
    }

    /// Simulated source centred on an arbitrary coordinate
    pub fn around(latitude: f64, longitude: f64, latency: Duration) -> Self {
        Self {
            latitude,
            longitude,
            latency,
            counter: AtomicU64::new(0),
        }
    }

    /// Map a sample counter to an offset in [-MAX_JITTER_DEG, MAX_JITTER_DEG].
    ///
    /// Repeatable within one build only; `DefaultHasher` may change across
    /// Rust releases.
    fn jitter(sample: u64, axis: u8) -> f64 {
        let mut hasher = DefaultHasher::new();
        sample.hash(&mut hasher);
        axis.hash(&mut hasher);
        let unit = (hasher.finish() % 2001) as f64 / 1000.0 - 1.0;
        unit * MAX_JITTER_DEG
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

#[async_trait]
impl PositionSource for SimulatedSource {
    async fn acquire(&self, high_accuracy: bool) -> Result<Fix, TrackingError> {
        let sample = self.counter.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;

        debug!("Simulated fix #{} (high_accuracy={})", sample, high_accuracy);
        Ok(Fix {
            latitude: self.latitude + Self::jitter(sample, 0),
            longitude: self.longitude + Self::jitter(sample, 1),
            accuracy: Some(5.0),
            altitude: Some(10.0),
            heading: None,
            speed: None,
        })
    }
}
