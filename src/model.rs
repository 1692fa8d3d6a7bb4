use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::MINUTES_PER_DAY;

/// Minutes since facility-local midnight; the only time type.
pub type Minute = u32;

/// Money in the catalog's currency. No rounding is applied anywhere.
pub type Cost = f64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: Minute,
    pub end: Minute,
}

impl TimeInterval {
    pub fn new(start: Minute, end: Minute) -> Self {
        debug_assert!(start < end, "TimeInterval start must be before end");
        Self { start, end }
    }

    /// Checked constructor for untrusted input.
    pub fn try_new(start: Minute, end: Minute) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_minutes(&self) -> Minute {
        self.end - self.start
    }

    /// Touching intervals (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_minute(&self, t: Minute) -> bool {
        self.start <= t && t < self.end
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", format_hhmm(self.start), format_hhmm(self.end))
    }
}

/// Parse a 24-hour `HH:MM` wall-clock time into minutes since midnight.
///
/// The hour may be one or two digits, the minute is exactly two. `24:00` is
/// accepted as the end of the day.
pub fn parse_hhmm(s: &str) -> Option<Minute> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: Minute = h.parse().ok()?;
    let minutes: Minute = m.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let total = hours * 60 + minutes;
    (total <= MINUTES_PER_DAY).then_some(total)
}

pub fn format_hhmm(t: Minute) -> String {
    format!("{:02}:{:02}", t / 60, t % 60)
}

/// One time-of-day rate band, `[start, end)` charged at `rate_per_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    pub start: Minute,
    pub end: Minute,
    pub rate_per_hour: f64,
}

impl RateTier {
    pub fn span(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end,
        }
    }
}

/// How a facility charges for time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PricingPolicy {
    Flat { rate_per_hour: f64 },
    /// Tiers are searched in this order; the catalog guarantees they don't overlap.
    Tiered { tiers: Vec<RateTier> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub pricing: PricingPolicy,
}

/// A confirmed reservation. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub facility: String,
    pub date: String,
    pub interval: TimeInterval,
    pub cost: Cost,
}

/// All confirmed bookings for one (facility, date), in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    pub bookings: Vec<Booking>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    /// Append without validation; callers check for conflicts first.
    pub fn insert(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    /// Bookings whose interval overlaps `candidate`. Linear scan.
    pub fn overlapping(&self, candidate: &TimeInterval) -> impl Iterator<Item = &Booking> {
        self.bookings
            .iter()
            .filter(move |b| candidate.start < b.interval.end && candidate.end > b.interval.start)
    }

    pub fn has_conflict(&self, candidate: &TimeInterval) -> bool {
        self.overlapping(candidate).next().is_some()
    }
}

/// The log record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    BookingConfirmed {
        id: Ulid,
        facility: String,
        date: String,
        interval: TimeInterval,
        cost: Cost,
    },
}

impl From<&Booking> for Event {
    fn from(b: &Booking) -> Self {
        Event::BookingConfirmed {
            id: b.id,
            facility: b.facility.clone(),
            date: b.date.clone(),
            interval: b.interval,
            cost: b.cost,
        }
    }
}

impl From<Event> for Booking {
    fn from(event: Event) -> Self {
        match event {
            Event::BookingConfirmed {
                id,
                facility,
                date,
                interval,
                cost,
            } => Booking {
                id,
                facility,
                date,
                interval,
                cost,
            },
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// One step of the pricing walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedSegment {
    pub interval: TimeInterval,
    pub rate_per_hour: f64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub total: Cost,
    pub segments: Vec<PricedSegment>,
}
