//! Bounding box around the viewer used to query the flight feed.

use serde::{Deserialize, Serialize};

/// Default half-width of the box in degrees, both axes.
pub const DEFAULT_DISPLACEMENT: f64 = 0.25;

/// Viewer position used in demo mode (St. Gallen area).
pub const DEMO_VIEWER: (f64, f64) = (47.6, 9.1);

/// Fixed box covering the demonstration region.
pub const DEMO_BOX: BoundingBox = BoundingBox {
    tl_x: 7.888184,
    tl_y: 48.107431,
    br_x: 10.327148,
    br_y: 47.092566,
};

/// Geographic box as the flight feed expects it: x is longitude, y is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub tl_x: f64,
    pub tl_y: f64,
    pub br_x: f64,
    pub br_y: f64,
}

impl BoundingBox {
    /// Render in the feed's `bounds` parameter order: `tl_y,br_y,tl_x,br_x`.
    pub fn to_bounds(&self) -> String {
        format!("{},{},{},{}", self.tl_y, self.br_y, self.tl_x, self.br_x)
    }
}

/// Compute the query box for a viewer. Demo mode ignores the coordinates.
pub fn geofence(latitude: f64, longitude: f64, dx: f64, dy: f64, demo: bool) -> BoundingBox {
    if demo {
        return DEMO_BOX;
    }

    BoundingBox {
        tl_x: longitude - dx,
        tl_y: latitude + dy,
        br_x: longitude + dx,
        br_y: latitude - dy,
    }
}
