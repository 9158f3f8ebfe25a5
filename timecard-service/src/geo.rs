//! Geodistance helpers
//!
//! Straight-line distance between two points, scaled up to approximate the
//! distance actually driven on roads.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse a `"lat,lon"` string.
    ///
    /// Returns `None` unless both halves are finite numbers inside the valid
    /// latitude/longitude ranges.
    pub fn parse(raw: &str) -> Option<Self> {
        let (lat, lon) = raw.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;

        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self { lat, lon })
    }
}

/// Great-circle distance in miles (haversine).
///
/// NaN inputs propagate to a NaN result; callers treat non-finite output as
/// "no distance available".
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Estimated road distance between two points.
pub fn driving_distance(from: Coordinates, to: Coordinates, driving_factor: f64) -> f64 {
    haversine_miles(from, to) * driving_factor
}

/// Estimated road distance between two `"lat,lon"` strings.
///
/// Degrades to `0.0` when either side is missing, malformed, or the result
/// is not finite.
pub fn driving_distance_between(from: Option<&str>, to: Option<&str>, driving_factor: f64) -> f64 {
    let (Some(from), Some(to)) = (
        from.and_then(Coordinates::parse),
        to.and_then(Coordinates::parse),
    ) else {
        return 0.0;
    };

    let distance = driving_distance(from, to, driving_factor);
    if distance.is_finite() {
        distance
    } else {
        0.0
    }
}
