//! Display-ready flight records derived from the raw API documents.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Category label a viewer can collect for spotting a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    RescueHelicopter,
    Zeppelin,
    JumboPlane,
    Ufo,
    Glider,
}

impl Badge {
    pub const ALL: [Badge; 5] = [
        Badge::RescueHelicopter,
        Badge::Zeppelin,
        Badge::JumboPlane,
        Badge::Ufo,
        Badge::Glider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::RescueHelicopter => "rescue-helicopter",
            Badge::Zeppelin => "zeppelin",
            Badge::JumboPlane => "jumbo-plane",
            Badge::Ufo => "ufo",
            Badge::Glider => "glider",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image shown for a flight together with its alt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightImage {
    pub src: String,
    pub alt: String,
}

/// Proximity of a flight to the viewer in plain coordinate units,
/// rounded to four decimals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    pub fn between(viewer: (f64, f64), flight: (f64, f64)) -> Self {
        let d_lat = viewer.0 - flight.0;
        let d_lon = viewer.1 - flight.1;
        let raw = (d_lat * d_lat + d_lon * d_lon).sqrt();
        Distance((raw * 10_000.0).round() / 10_000.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Legacy seven character sort key: decimal rendering with the point
    /// removed, left-padded with zeros. Only kept for display and for
    /// comparing against records stored by older deployments; ordering is
    /// done on the numeric value.
    pub fn rank_key(&self) -> String {
        let mut rendered = self.0.to_string();
        if !rendered.contains('.') {
            rendered.push_str(".0");
        }
        let digits: String = rendered.chars().filter(|c| *c != '.').collect();
        format!("{:0>7}", digits)
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A flight ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFlight {
    pub id: String,
    pub model: String,
    pub origin: String,
    pub destination: String,
    pub image: FlightImage,
    pub airline: String,
    /// Altitude in whole meters
    pub altitude: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub is_glider: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    pub distance: Distance,
}

/// One row of the bounding-box flight feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSummary {
    pub id: String,
    /// Altitude in feet
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
}
