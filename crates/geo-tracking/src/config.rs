//! Tracker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Position sampling options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Request the source's precise mode
    pub enable_high_accuracy: bool,

    /// Interval between continuous samples (milliseconds)
    pub update_interval_ms: u64,

    /// Upper bound for a single sample (milliseconds)
    pub timeout_ms: u64,
}

impl TrackerConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            update_interval_ms: 1000,
            timeout_ms: 5000,
        }
    }
}
