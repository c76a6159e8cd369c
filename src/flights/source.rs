//! Client for the external flight-tracking API.

use async_trait::async_trait;
use serde_json::Value;

use super::geofence::BoundingBox;
use crate::config::FlightApiConfig;
use crate::errors::AppError;
use crate::models::FlightSummary;

// Positions inside a feed row.
const ROW_LATITUDE: usize = 1;
const ROW_LONGITUDE: usize = 2;
const ROW_ALTITUDE: usize = 4;

/// Narrow interface to a flight-tracking provider.
#[async_trait]
pub trait FlightSource: Send + Sync {
    /// Render a bounding box in the provider's bounds format.
    fn get_bounds(&self, bbox: &BoundingBox) -> String {
        bbox.to_bounds()
    }

    /// Flights currently inside the bounds.
    async fn get_flights(&self, bounds: &str) -> Result<Vec<FlightSummary>, AppError>;

    /// Detail document for one flight, `None` when the provider has nothing usable.
    async fn get_flight_details(&self, flight_id: &str) -> Result<Option<Value>, AppError>;
}

/// HTTP client for the FlightRadar24 public feed.
pub struct Fr24Client {
    http: reqwest::Client,
    config: FlightApiConfig,
}

impl Fr24Client {
    pub fn new(config: FlightApiConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl FlightSource for Fr24Client {
    async fn get_flights(&self, bounds: &str) -> Result<Vec<FlightSummary>, AppError> {
        tracing::info!("Fetching flights within bounds {}", bounds);
        let body: Value = self
            .http
            .get(&self.config.feed_url)
            .query(&[
                ("bounds", bounds),
                ("faa", "1"),
                ("satellite", "1"),
                ("mlat", "1"),
                ("flarm", "1"),
                ("adsb", "1"),
                ("gnd", "1"),
                ("air", "1"),
                ("vehicles", "1"),
                ("estimated", "1"),
                ("maxage", "14400"),
                ("gliders", "1"),
                ("stats", "1"),
                ("limit", "5000"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_feed(&body))
    }

    async fn get_flight_details(&self, flight_id: &str) -> Result<Option<Value>, AppError> {
        tracing::debug!("Fetching details for flight {}", flight_id);
        let body: Value = self
            .http
            .get(&self.config.details_url)
            .query(&[("flight", flight_id), ("version", "1.5")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body.is_object().then_some(body))
    }
}

/// Extract flight summaries from a feed response.
///
/// The feed is an object whose array values are flight rows keyed by flight
/// id; scalar and object values (`full_count`, `version`, `stats`) are not
/// flights.
pub fn parse_feed(body: &Value) -> Vec<FlightSummary> {
    let Some(entries) = body.as_object() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(id, value)| {
            let row = value.as_array()?;
            Some(FlightSummary {
                id: id.clone(),
                latitude: row.get(ROW_LATITUDE)?.as_f64()?,
                longitude: row.get(ROW_LONGITUDE)?.as_f64()?,
                altitude: row.get(ROW_ALTITUDE)?.as_f64()?,
            })
        })
        .collect()
}
