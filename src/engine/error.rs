use ulid::Ulid;

use crate::model::Minute;

#[derive(Debug)]
pub enum EngineError {
    UnknownFacility(String),
    /// Overlaps the existing booking with this id.
    Conflict(Ulid),
    InvalidTimeFormat(String),
    InvalidInterval {
        start: Minute,
        end: Minute,
    },
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownFacility(name) => write!(f, "unknown facility: {name}"),
            EngineError::Conflict(id) => write!(f, "conflict with booking: {id}"),
            EngineError::InvalidTimeFormat(s) => write!(f, "invalid time format: {s:?}"),
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval: start {start} must be before end {end}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
