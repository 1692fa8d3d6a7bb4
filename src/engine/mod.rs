mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use error::EngineError;
pub use store::{BucketKey, IntervalStore};

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::model::*;
use crate::wal::Wal;

pub type SharedBucket = Arc<RwLock<Bucket>>;

/// The booking service: catalog lookup, conflict check, pricing and commit.
pub struct Engine {
    catalog: Arc<Catalog>,
    pub store: IntervalStore,
    /// `None` runs purely in memory.
    wal: Option<Mutex<Wal>>,
}

impl Engine {
    /// Engine with no log; bookings last as long as the process.
    pub fn in_memory(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            store: IntervalStore::new(),
            wal: None,
        }
    }

    /// Replay the log at `wal_path` into a fresh store, then keep appending to it.
    /// A torn tail is cut off first so new records follow the last valid one.
    pub fn open(catalog: Arc<Catalog>, wal_path: &Path) -> io::Result<Self> {
        let replay = Wal::replay(wal_path)?;
        let replayed = replay.events.len();
        let mut wal = Wal::open(wal_path)?;
        let dropped = wal.discard_tail(replay.valid_len)?;
        if dropped > 0 {
            warn!(
                "discarded {dropped} bytes of torn log tail after offset {}",
                replay.valid_len
            );
        }
        let buckets = restore_buckets(&catalog, replay.events);
        let store = IntervalStore::from_buckets(buckets);
        info!(
            "replayed {replayed} log records into {} buckets from {}",
            store.bucket_count(),
            wal_path.display()
        );
        Ok(Self {
            catalog,
            store,
            wal: Some(Mutex::new(wal)),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_persistent(&self) -> bool {
        self.wal.is_some()
    }

    /// Durably record a booking. No-op without a log.
    async fn wal_append(&self, booking: &Booking) -> Result<(), EngineError> {
        let Some(wal) = &self.wal else { return Ok(()) };
        let event = Event::from(booking);
        let started = std::time::Instant::now();
        let result = wal.lock().await.append(&event);
        metrics::histogram!(crate::observability::WAL_APPEND_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result.map_err(|e| EngineError::WalError(e.to_string()))
    }
}

/// Rebuild buckets from log records. Records that no longer fit the catalog
/// or the non-overlap invariant are skipped.
fn restore_buckets(catalog: &Catalog, events: Vec<Event>) -> HashMap<BucketKey, Bucket> {
    let mut buckets: HashMap<BucketKey, Bucket> = HashMap::new();
    for event in events {
        let booking = Booking::from(event);
        if !catalog.contains(&booking.facility) {
            warn!(
                "skipping logged booking {} for unknown facility {:?}",
                booking.id, booking.facility
            );
            continue;
        }
        if conflict::validate_interval(&booking.interval).is_err() {
            warn!("skipping logged booking {} with invalid interval", booking.id);
            continue;
        }
        let bucket = buckets
            .entry(BucketKey::new(&booking.facility, &booking.date))
            .or_default();
        if let Err(e) = conflict::check_no_conflict(bucket, &booking.interval) {
            warn!("skipping logged booking {}: {e}", booking.id);
            continue;
        }
        bucket.insert(booking);
    }
    buckets
}
