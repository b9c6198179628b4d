//! Planar lat/lng geometry.
//!
//! Distances are plain Euclidean over `(lng, lat)` degrees. There is no
//! great-circle correction, so values near the poles or across the ±180°
//! seam are not metric.

use serde::{Deserialize, Serialize};

/// Distance between opposite corners of the `[-180, 180] × [-90, 90]` plane.
pub const MAX_DISTANCE: f64 = 402.492_235_949_962_1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lng: f64,
    pub lat: f64,
}

impl Coords {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn distance(&self, other: &Coords) -> f64 {
        distance(*self, *other)
    }
}

pub fn distance(a: Coords, b: Coords) -> f64 {
    let d_lng = a.lng - b.lng;
    let d_lat = a.lat - b.lat;
    (d_lng * d_lng + d_lat * d_lat).sqrt()
}

/// Rectangular cell boundary in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Bounds {
    pub fn center(&self) -> Coords {
        Coords {
            lng: (self.east + self.west) / 2.0,
            lat: (self.north + self.south) / 2.0,
        }
    }

    /// Half-open test: the south and west edges belong to this cell.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.south <= lat && lat < self.north && self.west <= lng && lng < self.east
    }
}
