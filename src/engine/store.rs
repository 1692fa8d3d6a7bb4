use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::model::*;

use super::SharedBucket;

/// Identifies one bucket: a facility on a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub facility: String,
    pub date: String,
}

impl BucketKey {
    pub fn new(facility: &str, date: &str) -> Self {
        Self {
            facility: facility.to_string(),
            date: date.to_string(),
        }
    }
}

/// Confirmed bookings, bucketed per (facility, date).
///
/// Each bucket sits behind its own lock, so bookings for different
/// facilities or days never contend.
pub struct IntervalStore {
    buckets: DashMap<BucketKey, SharedBucket>,
}

impl Default for IntervalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalStore {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Build a store from bookings that are already known to be conflict-free
    /// per bucket (e.g. replayed from the log). No locking involved.
    pub fn from_buckets(buckets: HashMap<BucketKey, Bucket>) -> Self {
        let store = Self::new();
        for (key, bucket) in buckets {
            store.buckets.insert(key, Arc::new(RwLock::new(bucket)));
        }
        store
    }

    // ── Bucket access ────────────────────────────────────────

    pub fn bucket(&self, facility: &str, date: &str) -> Option<SharedBucket> {
        self.buckets
            .get(&BucketKey::new(facility, date))
            .map(|e| e.value().clone())
    }

    /// Get the bucket, creating an empty one if absent.
    pub fn bucket_or_create(&self, facility: &str, date: &str) -> SharedBucket {
        self.buckets
            .entry(BucketKey::new(facility, date))
            .or_default()
            .value()
            .clone()
    }

    /// Drop the bucket if it is empty and nobody else holds it. Used to undo
    /// `bucket_or_create` when a booking fails after the bucket was made.
    pub fn remove_if_unused(&self, facility: &str, date: &str) -> bool {
        self.buckets
            .remove_if(&BucketKey::new(facility, date), |_, bucket| {
                Arc::strong_count(bucket) == 1
                    && bucket.try_read().is_ok_and(|guard| guard.is_empty())
            })
            .is_some()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn contains_bucket(&self, facility: &str, date: &str) -> bool {
        self.buckets.contains_key(&BucketKey::new(facility, date))
    }

    // ── Interval operations ──────────────────────────────────

    /// True iff `candidate` overlaps any booking in the bucket. Never creates a bucket.
    pub async fn has_conflict(&self, facility: &str, date: &str, candidate: &TimeInterval) -> bool {
        match self.bucket(facility, date) {
            Some(bucket) => bucket.read().await.has_conflict(candidate),
            None => false,
        }
    }

    /// Append to the bucket without any checks. The engine runs the conflict
    /// check and the append under one write guard instead of calling this.
    pub async fn insert(&self, facility: &str, date: &str, booking: Booking) {
        let bucket = self.bucket_or_create(facility, date);
        bucket.write().await.insert(booking);
    }

    /// Bookings for one bucket in insertion order.
    pub async fn bookings(&self, facility: &str, date: &str) -> Vec<Booking> {
        match self.bucket(facility, date) {
            Some(bucket) => bucket.read().await.bookings.clone(),
            None => Vec::new(),
        }
    }

    pub async fn booking_count(&self) -> usize {
        let buckets: Vec<SharedBucket> = self.buckets.iter().map(|e| e.value().clone()).collect();
        let mut total = 0;
        for bucket in buckets {
            total += bucket.read().await.len();
        }
        total
    }
}
