//! Position Tracking
//!
//! Samples the vehicle's geographic position either on demand or on a fixed
//! interval in a background task, and provides haversine distance between
//! samples.

mod config;
mod distance;
mod error;
mod position;
mod source;
mod tracker;

pub use config::TrackerConfig;
pub use distance::{distance_km, haversine_km, TripOdometer, EARTH_RADIUS_KM};
pub use error::TrackingError;
pub use position::{Fix, GeoPosition};
pub use source::{PositionSource, SimulatedSource, REFERENCE_LATITUDE, REFERENCE_LONGITUDE};
pub use tracker::{PositionTracker, SampleClock};
