use tracing::debug;
use ulid::Ulid;

use crate::model::*;
use crate::pricing;

use super::conflict::{check_no_conflict, parse_interval, validate_date, validate_interval};
use super::{Engine, EngineError};

impl Engine {
    /// Book `facility` on `date` from `start` to `end` (`HH:MM`).
    ///
    /// Malformed times fail before the catalog is consulted. Every failure
    /// leaves the store untouched.
    pub async fn book(
        &self,
        facility: &str,
        date: &str,
        start: &str,
        end: &str,
    ) -> Result<Booking, EngineError> {
        let interval = parse_interval(start, end)?;
        self.book_interval(facility, date, interval).await
    }

    pub async fn book_interval(
        &self,
        facility: &str,
        date: &str,
        interval: TimeInterval,
    ) -> Result<Booking, EngineError> {
        validate_interval(&interval)?;
        validate_date(date)?;
        let facility = self
            .catalog
            .get(facility)
            .ok_or_else(|| EngineError::UnknownFacility(facility.to_string()))?;

        // Check and commit under one write guard so two overlapping requests
        // for the same bucket cannot both pass the check.
        let bucket = self.store.bucket_or_create(&facility.name, date);
        let mut guard = bucket.write().await;
        if let Err(e) = check_no_conflict(&guard, &interval) {
            debug!("{} on {date} {interval} rejected: {e}", facility.name);
            return Err(e);
        }

        let cost = pricing::price(&facility.pricing, &interval);
        let booking = Booking {
            id: Ulid::new(),
            facility: facility.name.clone(),
            date: date.to_string(),
            interval,
            cost,
        };
        if let Err(e) = self.wal_append(&booking).await {
            drop(guard);
            drop(bucket);
            self.store.remove_if_unused(&facility.name, date);
            return Err(e);
        }
        guard.insert(booking.clone());
        debug!("{} on {date} {interval} booked as {} for {cost}", facility.name, booking.id);
        Ok(booking)
    }
}
