//! Canned flight source for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::source::FlightSource;
use crate::errors::AppError;
use crate::models::FlightSummary;

/// In-memory flight source with canned responses.
#[derive(Default)]
pub struct StaticSource {
    pub flights: Vec<FlightSummary>,
    pub details: BTreeMap<String, Value>,
    pub failing: Vec<String>,
    pub requested_bounds: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn with_flight(mut self, id: &str, altitude: f64, lat: f64, lon: f64, detail: Value) -> Self {
        self.flights.push(FlightSummary {
            id: id.to_string(),
            altitude,
            latitude: lat,
            longitude: lon,
        });
        self.details.insert(id.to_string(), detail);
        self
    }
}

#[async_trait]
impl FlightSource for StaticSource {
    async fn get_flights(&self, bounds: &str) -> Result<Vec<FlightSummary>, AppError> {
        self.requested_bounds
            .lock()
            .unwrap()
            .push(bounds.to_string());
        Ok(self.flights.clone())
    }

    async fn get_flight_details(&self, flight_id: &str) -> Result<Option<Value>, AppError> {
        if self.failing.iter().any(|id| id == flight_id) {
            return Err(AppError::Upstream("detail endpoint timed out".to_string()));
        }
        Ok(self
            .details
            .get(flight_id)
            .filter(|d| d.is_object())
            .cloned())
    }
}
