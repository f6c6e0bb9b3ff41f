//! Vehicle Telemetry Monitor
//!
//! Composition root for one vehicle: an OBD-II adapter link plus a position
//! tracker, merged into serializable snapshots for the dashboard and storage
//! layers.

mod config;
mod error;
mod monitor;
mod snapshot;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::VehicleMonitor;
pub use snapshot::{DiagnosticsRecord, VehicleSnapshot};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global tracing subscriber (`RUST_LOG` aware, `info` by default)
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
