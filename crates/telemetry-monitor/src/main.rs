//! Vehicle Telemetry Daemon - Main Entry Point

use geo_tracking::TripOdometer;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use telemetry_monitor::{init_logging, MonitorConfig, VehicleMonitor};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    info!("=== Vehicle Telemetry Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let path = std::env::var("TELEMETRY_CONFIG").unwrap_or_else(|_| "telemetry".to_string());
    let config = MonitorConfig::load(&path)?;
    let mut monitor = VehicleMonitor::new(&config);

    if let Err(e) = monitor.initialize(&config.device_name).await {
        warn!("{}; continuing with position data only", e);
    }

    let odometer = Arc::new(Mutex::new(TripOdometer::new()));
    let trip = Arc::clone(&odometer);
    monitor.start_tracking(move |position| {
        let mut trip = trip.lock().unwrap_or_else(PoisonError::into_inner);
        let leg_km = trip.record(position);
        debug!(
            "Position {:.6},{:.6} (+{:.3} km)",
            position.latitude, position.longitude, leg_km
        );
    })?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(config.snapshot_interval().max(Duration::from_millis(1)));

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let snapshot = monitor.get_vehicle_data(&config.vehicle_id).await;
                println!("{}", serde_json::to_string(&snapshot)?);
            }
        }
    }

    monitor.shutdown().await;
    let trip = odometer.lock().unwrap_or_else(PoisonError::into_inner);
    info!(
        "Trip: {:.3} km over {} samples",
        trip.total_km(),
        trip.samples()
    );

    Ok(())
}
