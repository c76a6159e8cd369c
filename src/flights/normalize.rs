//! Turns raw flight detail documents into display records.
//!
//! Every field lookup tolerates absence; a missing field falls back to a
//! named default and never affects the other fields or records.

use std::collections::BTreeMap;

use serde_json::Value;

use super::geofence::DEMO_VIEWER;
use crate::models::{Badge, Distance, FlightImage, NormalizedFlight};

pub const ORIGIN_UNKNOWN: &str = "Origin unknown :/";
pub const DESTINATION_UNKNOWN: &str = "Destination unknown :/";
pub const AIRLINE_UNKNOWN: &str = "Airline unknown :/";
pub const NO_IMAGE_ALT: &str = "We have no idea how this one looks";
pub const PLACEHOLDER_IMAGE: &str = "/static/images/unknown-aircraft.svg";

/// Thumbnail the flight API serves for gliders without their own photo.
pub const GLIDER_THUMBNAILS: &[&str] = &[
    "https://www.flightradar24.com/static/images/aircraft/glider.jpg",
    "https://cdn.flightradar24.com/assets/aircraft/glider.jpg",
];

const FEET_PER_METER: f64 = 3.2808;

const IMAGE_SOURCES: [&str; 3] = [
    "/aircraft/images/thumbnails/0/src",
    "/aircraft/images/medium/0/src",
    "/aircraft/images/large/0/src",
];

const RESCUE_AIRLINES: [&str; 2] = ["rettung", "ambulanz"];
const JUMBO_MODELS: [&str; 4] = ["airbus a350", "airbus a380", "boeing 747", "boeing 777"];
const GLIDER_AIRLINES: [&str; 2] = ["segel", "glid"];
const GLIDER_MODELS: [&str; 3] = ["schempp-hirth", "lange", "alexander schleicher"];

/// String at a JSON pointer path, or the default when missing or not a string.
pub fn get_or_default<'a>(document: &'a Value, path: &str, default: &'a str) -> &'a str {
    document
        .pointer(path)
        .and_then(Value::as_str)
        .unwrap_or(default)
}

/// Number at a JSON pointer path, or the default when missing or not numeric.
pub fn number_or_default(document: &Value, path: &str, default: f64) -> f64 {
    document
        .pointer(path)
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

/// Normalize, filter and sort a batch of detail documents keyed by flight id.
///
/// Records without an aircraft model are dropped. The result is ordered by
/// distance to the viewer, nearest first. In demo mode the viewer sits at the
/// center of the demonstration region.
pub fn clean_flight_details(
    details: &BTreeMap<String, Value>,
    latitude: f64,
    longitude: f64,
    demo: bool,
) -> Vec<NormalizedFlight> {
    let viewer = if demo {
        DEMO_VIEWER
    } else {
        (latitude, longitude)
    };

    let mut flights: Vec<NormalizedFlight> = details
        .iter()
        .filter_map(|(id, raw)| normalize_flight(id, raw, viewer))
        .collect();

    flights.sort_by_key(|f| f.distance);
    flights
}

/// Normalize one detail document. Returns `None` when the model is unknown.
pub fn normalize_flight(id: &str, raw: &Value, viewer: (f64, f64)) -> Option<NormalizedFlight> {
    let model = get_or_default(raw, "/aircraft/model/text", "");
    if model.is_empty() {
        tracing::debug!(flight_id = id, "dropping flight without aircraft model");
        return None;
    }

    let origin = get_or_default(raw, "/airport/origin/name", ORIGIN_UNKNOWN);
    let destination = get_or_default(raw, "/airport/destination/name", DESTINATION_UNKNOWN);
    let image = select_image(raw, model);
    let airline = get_or_default(raw, "/airline/name", AIRLINE_UNKNOWN);
    let altitude = feet_to_meters(number_or_default(raw, "/altitude", 0.0));
    let latitude = number_or_default(raw, "/latitude", 0.0);
    let longitude = number_or_default(raw, "/longitude", 0.0);

    let is_glider = is_glider(&image.src, airline, model);
    let badge = classify(airline, model, &image, is_glider);

    Some(NormalizedFlight {
        id: id.to_string(),
        model: model.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        image,
        airline: airline.to_string(),
        altitude,
        latitude,
        longitude,
        is_glider,
        badge,
        distance: Distance::between(viewer, (latitude, longitude)),
    })
}

/// First available of thumbnail, medium and large; placeholder otherwise.
fn select_image(raw: &Value, model: &str) -> FlightImage {
    IMAGE_SOURCES
        .iter()
        .find_map(|path| raw.pointer(path).and_then(Value::as_str))
        .map(|src| FlightImage {
            src: src.to_string(),
            alt: model.to_string(),
        })
        .unwrap_or_else(|| FlightImage {
            src: PLACEHOLDER_IMAGE.to_string(),
            alt: NO_IMAGE_ALT.to_string(),
        })
}

/// Whole meters, truncated toward zero.
fn feet_to_meters(feet: f64) -> i64 {
    (feet / FEET_PER_METER).trunc() as i64
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn is_glider(image_src: &str, airline: &str, model: &str) -> bool {
    GLIDER_THUMBNAILS.contains(&image_src)
        || contains_any(airline, &GLIDER_AIRLINES)
        || contains_any(model, &GLIDER_MODELS)
}

/// First matching rule wins: rescue, zeppelin, jumbo, ufo, glider.
pub fn classify(airline: &str, model: &str, image: &FlightImage, is_glider: bool) -> Option<Badge> {
    if contains_any(airline, &RESCUE_AIRLINES) {
        Some(Badge::RescueHelicopter)
    } else if contains_any(model, &["zeppelin"]) {
        Some(Badge::Zeppelin)
    } else if contains_any(model, &JUMBO_MODELS) {
        Some(Badge::JumboPlane)
    } else if image.alt == NO_IMAGE_ALT {
        Some(Badge::Ufo)
    } else if is_glider {
        Some(Badge::Glider)
    } else {
        None
    }
}
