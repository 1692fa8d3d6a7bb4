//! Facility catalog: loading, validation, and lookup by name.
//!
//! The pricing walk and the booking engine assume the invariants checked
//! here (unique names, well-formed non-overlapping tiers) and do not
//! re-validate them.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::limits::*;
use crate::model::*;

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateFacility(String),
    InvalidTime { facility: String, value: String },
    InvalidTier { facility: String, index: usize },
    OverlappingTiers { facility: String, first: usize, second: usize },
    InvalidRate { facility: String },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "catalog read failed: {e}"),
            CatalogError::Json(e) => write!(f, "catalog is not valid JSON: {e}"),
            CatalogError::DuplicateFacility(name) => write!(f, "duplicate facility: {name}"),
            CatalogError::InvalidTime { facility, value } => {
                write!(f, "{facility}: invalid time {value:?}")
            }
            CatalogError::InvalidTier { facility, index } => {
                write!(f, "{facility}: tier {index} must satisfy start < end <= 24:00")
            }
            CatalogError::OverlappingTiers {
                facility,
                first,
                second,
            } => write!(f, "{facility}: tiers {first} and {second} overlap"),
            CatalogError::InvalidRate { facility } => {
                write!(f, "{facility}: rates must be finite and non-negative")
            }
            CatalogError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            CatalogError::Json(e) => Some(e),
            _ => None,
        }
    }
}

// ── File format ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FacilityRecord {
    name: String,
    pricing: PolicyRecord,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PolicyRecord {
    Flat { rate: f64 },
    Tiered { tiers: Vec<TierRecord> },
}

#[derive(Debug, Deserialize)]
struct TierRecord {
    start: String,
    end: String,
    rate: f64,
}

fn parse_time(facility: &str, value: &str) -> Result<Minute, CatalogError> {
    parse_hhmm(value).ok_or_else(|| CatalogError::InvalidTime {
        facility: facility.to_string(),
        value: value.to_string(),
    })
}

impl FacilityRecord {
    fn into_facility(self) -> Result<Facility, CatalogError> {
        let pricing = match self.pricing {
            PolicyRecord::Flat { rate } => PricingPolicy::Flat { rate_per_hour: rate },
            PolicyRecord::Tiered { tiers } => {
                let tiers = tiers
                    .into_iter()
                    .map(|t| {
                        Ok(RateTier {
                            start: parse_time(&self.name, &t.start)?,
                            end: parse_time(&self.name, &t.end)?,
                            rate_per_hour: t.rate,
                        })
                    })
                    .collect::<Result<Vec<_>, CatalogError>>()?;
                PricingPolicy::Tiered { tiers }
            }
        };
        Ok(Facility {
            name: self.name,
            pricing,
        })
    }
}

// ── Catalog ──────────────────────────────────────────────────────

/// Immutable set of bookable facilities, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_name: HashMap<String, Facility>,
    /// Names in load order, for listings.
    order: Vec<String>,
}

impl Catalog {
    pub fn new(facilities: Vec<Facility>) -> Result<Self, CatalogError> {
        if facilities.len() > MAX_FACILITIES {
            return Err(CatalogError::LimitExceeded("too many facilities"));
        }
        let mut by_name = HashMap::with_capacity(facilities.len());
        let mut order = Vec::with_capacity(facilities.len());
        for facility in facilities {
            validate_facility(&facility)?;
            if by_name.contains_key(&facility.name) {
                return Err(CatalogError::DuplicateFacility(facility.name));
            }
            order.push(facility.name.clone());
            by_name.insert(facility.name.clone(), facility);
        }
        Ok(Self { by_name, order })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<FacilityRecord> = serde_json::from_str(json).map_err(CatalogError::Json)?;
        let facilities = records
            .into_iter()
            .map(FacilityRecord::into_facility)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(facilities)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(CatalogError::Io)?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, name: &str) -> Option<&Facility> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Facilities in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Facility> {
        self.order.iter().filter_map(|n| self.by_name.get(n))
    }
}

fn validate_facility(facility: &Facility) -> Result<(), CatalogError> {
    if facility.name.is_empty() || facility.name.len() > MAX_NAME_LEN {
        return Err(CatalogError::LimitExceeded("facility name length"));
    }
    let invalid_rate = || CatalogError::InvalidRate {
        facility: facility.name.clone(),
    };
    match &facility.pricing {
        PricingPolicy::Flat { rate_per_hour } => {
            if !rate_per_hour.is_finite() || *rate_per_hour < 0.0 {
                return Err(invalid_rate());
            }
        }
        PricingPolicy::Tiered { tiers } => {
            if tiers.len() > MAX_TIERS_PER_POLICY {
                return Err(CatalogError::LimitExceeded("too many tiers"));
            }
            for (index, t) in tiers.iter().enumerate() {
                if t.start >= t.end || t.end > MINUTES_PER_DAY {
                    return Err(CatalogError::InvalidTier {
                        facility: facility.name.clone(),
                        index,
                    });
                }
                if !t.rate_per_hour.is_finite() || t.rate_per_hour < 0.0 {
                    return Err(invalid_rate());
                }
            }
            // Sort indices by start; any overlap shows up between neighbours.
            let mut idx: Vec<usize> = (0..tiers.len()).collect();
            idx.sort_by_key(|&i| tiers[i].start);
            for pair in idx.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if tiers[a].span().overlaps(&tiers[b].span()) {
                    return Err(CatalogError::OverlappingTiers {
                        facility: facility.name.clone(),
                        first: a.min(b),
                        second: a.max(b),
                    });
                }
            }
        }
    }
    Ok(())
}
