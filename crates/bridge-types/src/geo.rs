//! Geographic primitives used by geo filters and distance sorting.

use serde::{Deserialize, Serialize};

/// A geographic point (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A distance, carried internally in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance {
    km: f64,
}

impl Distance {
    pub fn from_km(km: f64) -> Self {
        Self { km }
    }

    pub fn from_m(m: f64) -> Self {
        Self { km: m / 1000.0 }
    }

    pub fn km(&self) -> f64 {
        self.km
    }

    pub fn m(&self) -> f64 {
        self.km * 1000.0
    }
}

/// Normalize two corner points into `((south, west), (north, east))`.
///
/// Callers may hand the corners in any order; the engine's bounding-box
/// filter needs them sorted.
pub fn bounding_box(point_1: Point, point_2: Point) -> ((f64, f64), (f64, f64)) {
    let south = point_1.lat.min(point_2.lat);
    let north = point_1.lat.max(point_2.lat);
    let west = point_1.lon.min(point_2.lon);
    let east = point_1.lon.max(point_2.lon);
    ((south, west), (north, east))
}
