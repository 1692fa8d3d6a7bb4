use crate::model::*;
use crate::pricing;

use super::conflict::{parse_interval, validate_date};
use super::{Engine, EngineError};

impl Engine {
    /// Price an interval without booking it.
    pub fn quote(&self, facility: &str, start: &str, end: &str) -> Result<Quote, EngineError> {
        let interval = parse_interval(start, end)?;
        self.quote_interval(facility, &interval)
    }

    pub fn quote_interval(&self, facility: &str, interval: &TimeInterval) -> Result<Quote, EngineError> {
        let facility = self
            .catalog
            .get(facility)
            .ok_or_else(|| EngineError::UnknownFacility(facility.to_string()))?;
        Ok(pricing::quote(&facility.pricing, interval))
    }

    /// Confirmed bookings for a facility and date, in the order they were made.
    pub async fn bookings(&self, facility: &str, date: &str) -> Result<Vec<Booking>, EngineError> {
        validate_date(date)?;
        if !self.catalog.contains(facility) {
            return Err(EngineError::UnknownFacility(facility.to_string()));
        }
        Ok(self.store.bookings(facility, date).await)
    }

    /// Whether `interval` is free for the facility on `date`.
    pub async fn is_available(
        &self,
        facility: &str,
        date: &str,
        interval: &TimeInterval,
    ) -> Result<bool, EngineError> {
        if !self.catalog.contains(facility) {
            return Err(EngineError::UnknownFacility(facility.to_string()));
        }
        Ok(!self.store.has_conflict(facility, date, interval).await)
    }

    /// Catalog facilities in load order.
    pub fn facilities(&self) -> Vec<Facility> {
        self.catalog.iter().cloned().collect()
    }
}
