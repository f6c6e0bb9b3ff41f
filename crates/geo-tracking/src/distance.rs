//! Great-circle distance

use crate::position::GeoPosition;

/// Mean Earth radius used by the haversine formula (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn to_radians(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Haversine distance between two latitude/longitude pairs in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = to_radians(lat2 - lat1);
    let d_lon = to_radians(lon2 - lon1);

    let a = (d_lat / 2.0).sin().powi(2)
        + to_radians(lat1).cos() * to_radians(lat2).cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push antipodal points just past 1
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two samples in kilometers
pub fn distance_km(a: &GeoPosition, b: &GeoPosition) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Running total of distance covered by consecutive samples
#[derive(Debug, Clone, Default)]
pub struct TripOdometer {
    last: Option<GeoPosition>,
    total_km: f64,
    samples: u64,
}

impl TripOdometer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample, returning the leg distance from the previous one
    pub fn record(&mut self, position: GeoPosition) -> f64 {
        let leg = self
            .last
            .as_ref()
            .map(|prev| distance_km(prev, &position))
            .unwrap_or(0.0);
        self.total_km += leg;
        self.samples += 1;
        self.last = Some(position);
        leg
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn at(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::new(lat, lon, Utc::now())
    }

    #[test]
    fn test_known_distance() {
        // New York -> London, roughly 5570 km
        let nyc = at(40.7128, -74.0060);
        let london = at(51.5074, -0.1278);
        let d = distance_km(&nyc, &london);
        assert!((d - 5570.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_odometer_accumulates() {
        let mut odo = TripOdometer::new();
        assert_eq!(odo.record(at(0.0, 0.0)), 0.0);
        let leg = odo.record(at(1.0, 0.0));
        odo.record(at(1.0, 0.0));
        assert!((odo.total_km() - leg).abs() < 1e-9);
        assert_eq!(odo.samples(), 3);

        odo.reset();
        assert_eq!(odo.total_km(), 0.0);
        assert_eq!(odo.samples(), 0);
    }

    proptest! {
        #[test]
        fn identical_points_are_zero(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let p = at(lat, lon);
            prop_assert!(distance_km(&p, &p).abs() < 1e-9);
        }

        #[test]
        fn distance_is_symmetric(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let a = at(lat1, lon1);
            let b = at(lat2, lon2);
            prop_assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-9);
        }

        #[test]
        fn distance_bounded_by_half_circumference(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let d = haversine_km(lat1, lon1, lat2, lon2);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
