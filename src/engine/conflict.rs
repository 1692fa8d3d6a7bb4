use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn parse_interval(start: &str, end: &str) -> Result<TimeInterval, EngineError> {
    let s = parse_hhmm(start).ok_or_else(|| EngineError::InvalidTimeFormat(start.to_string()))?;
    let e = parse_hhmm(end).ok_or_else(|| EngineError::InvalidTimeFormat(end.to_string()))?;
    TimeInterval::try_new(s, e).ok_or(EngineError::InvalidInterval { start: s, end: e })
}

pub(crate) fn validate_interval(interval: &TimeInterval) -> Result<(), EngineError> {
    if interval.start >= interval.end {
        return Err(EngineError::InvalidInterval {
            start: interval.start,
            end: interval.end,
        });
    }
    if interval.end > MINUTES_PER_DAY {
        return Err(EngineError::LimitExceeded("interval extends past end of day"));
    }
    Ok(())
}

pub(crate) fn validate_date(date: &str) -> Result<(), EngineError> {
    if date.len() > MAX_DATE_LEN {
        return Err(EngineError::LimitExceeded("date key too long"));
    }
    Ok(())
}

/// Fails with the id of the first existing booking that overlaps `candidate`.
pub(crate) fn check_no_conflict(bucket: &Bucket, candidate: &TimeInterval) -> Result<(), EngineError> {
    match bucket.overlapping(candidate).next() {
        Some(existing) => Err(EngineError::Conflict(existing.id)),
        None => Ok(()),
    }
}
