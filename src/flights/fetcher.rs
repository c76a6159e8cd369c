//! Fetch orchestration: bounds query, altitude filter, per-flight details.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::geofence::{geofence, BoundingBox, DEFAULT_DISPLACEMENT};
use super::normalize::clean_flight_details;
use super::source::FlightSource;
use crate::db::{FlightDocument, Repository};
use crate::errors::AppError;
use crate::models::NormalizedFlight;

/// Flights at or below this altitude (feet) are ignored.
pub const MIN_ALTITUDE_FEET: f64 = 100.0;

/// Where the viewer is looking from.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewerQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub demo: Option<bool>,
}

impl ViewerQuery {
    /// Demo mode unless both coordinates are given, or when asked for.
    pub fn is_demo(&self) -> bool {
        self.demo.unwrap_or(false) || self.lat.is_none() || self.lon.is_none()
    }
}

/// Owns the flight source and drives one lookup per request.
#[derive(Clone)]
pub struct FlightFetcher {
    source: Arc<dyn FlightSource>,
}

impl FlightFetcher {
    pub fn new(source: Arc<dyn FlightSource>) -> Self {
        Self { source }
    }

    /// Detail documents for all flights in the box above the altitude floor.
    ///
    /// The position and altitude from the feed are merged into each detail
    /// document. A failed or malformed detail response only skips that flight.
    pub async fn fetch_details(
        &self,
        bbox: &BoundingBox,
    ) -> Result<BTreeMap<String, Value>, AppError> {
        let bounds = self.source.get_bounds(bbox);
        let flights = self.source.get_flights(&bounds).await?;
        tracing::info!("{} flights inside {}", flights.len(), bounds);

        let mut details = BTreeMap::new();
        for flight in flights.iter().filter(|f| f.altitude > MIN_ALTITUDE_FEET) {
            let mut detail = match self.source.get_flight_details(&flight.id).await {
                Ok(Some(detail)) => detail,
                Ok(None) => {
                    tracing::warn!(flight_id = %flight.id, "skipping flight without detail record");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(flight_id = %flight.id, "skipping flight, detail fetch failed: {}", e);
                    continue;
                }
            };

            let Some(fields) = detail.as_object_mut() else {
                continue;
            };
            fields.insert("altitude".to_string(), json!(flight.altitude));
            fields.insert("latitude".to_string(), json!(flight.latitude));
            fields.insert("longitude".to_string(), json!(flight.longitude));

            details.insert(flight.id.clone(), detail);
        }

        Ok(details)
    }

    /// Geofence, fetch, persist the raw documents, then normalize and sort.
    pub async fn nearby_flights(
        &self,
        repo: &Repository,
        query: &ViewerQuery,
    ) -> Result<Vec<NormalizedFlight>, AppError> {
        let demo = query.is_demo();
        let latitude = query.lat.unwrap_or_default();
        let longitude = query.lon.unwrap_or_default();

        let bbox = geofence(
            latitude,
            longitude,
            DEFAULT_DISPLACEMENT,
            DEFAULT_DISPLACEMENT,
            demo,
        );
        let details = self.fetch_details(&bbox).await?;

        let documents: Vec<FlightDocument> = details
            .iter()
            .map(|(id, document)| FlightDocument {
                flight_id: Some(id.clone()),
                document: document.clone(),
            })
            .collect();
        if !documents.is_empty() {
            let batch_id = Uuid::new_v4();
            repo.insert_flight_records(batch_id, &documents).await?;
            tracing::debug!(%batch_id, "stored {} raw flight records", documents.len());
        }

        Ok(clean_flight_details(&details, latitude, longitude, demo))
    }
}
