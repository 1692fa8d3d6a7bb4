//! Cost of a time interval under a facility's pricing policy.
//!
//! Flat policies charge `rate * minutes / 60`. Tiered policies walk the
//! interval tier by tier:
//!
//! - each step takes the FIRST tier (in catalog order) that overlaps the
//!   remaining `[current, end)`, not the cheapest or the earliest-starting;
//! - the step is charged from `current` to `min(end, tier.end)` at that tier's
//!   rate, so uncovered time lying before the matched tier is billed at the
//!   matched tier's rate;
//! - once no tier overlaps the remainder the walk stops and the rest of the
//!   interval is free.
//!
//! The last rule means a booking that falls entirely outside every tier costs
//! nothing. That is the intended gap policy, not an error.

use crate::model::*;

pub fn price(policy: &PricingPolicy, interval: &TimeInterval) -> Cost {
    match policy {
        PricingPolicy::Flat { rate_per_hour } => flat_cost(*rate_per_hour, interval),
        PricingPolicy::Tiered { tiers } => TierWalk::new(tiers, *interval).map(|s| s.cost).sum(),
    }
}

/// Same computation as [`price`], itemized.
pub fn quote(policy: &PricingPolicy, interval: &TimeInterval) -> Quote {
    let segments: Vec<PricedSegment> = match policy {
        PricingPolicy::Flat { rate_per_hour } => vec![PricedSegment {
            interval: *interval,
            rate_per_hour: *rate_per_hour,
            cost: flat_cost(*rate_per_hour, interval),
        }],
        PricingPolicy::Tiered { tiers } => TierWalk::new(tiers, *interval).collect(),
    };
    let total = segments.iter().map(|s| s.cost).sum();
    Quote { total, segments }
}

fn flat_cost(rate_per_hour: f64, interval: &TimeInterval) -> Cost {
    rate_per_hour * interval.duration_minutes() as f64 / 60.0
}

/// Iterator over the steps of the tiered walk.
struct TierWalk<'a> {
    tiers: &'a [RateTier],
    current: Minute,
    end: Minute,
}

impl<'a> TierWalk<'a> {
    fn new(tiers: &'a [RateTier], interval: TimeInterval) -> Self {
        Self {
            tiers,
            current: interval.start,
            end: interval.end,
        }
    }
}

impl Iterator for TierWalk<'_> {
    type Item = PricedSegment;

    fn next(&mut self) -> Option<PricedSegment> {
        if self.current >= self.end {
            return None;
        }
        let (current, end) = (self.current, self.end);
        let tier = self
            .tiers
            .iter()
            .find(|t| current < t.end && end > t.start)?;

        // tier.end > current and end > current, so every step advances.
        let overlap_end = end.min(tier.end);
        debug_assert!(overlap_end > current);
        self.current = overlap_end;

        Some(PricedSegment {
            interval: TimeInterval::new(current, overlap_end),
            rate_per_hour: tier.rate_per_hour,
            cost: tier.rate_per_hour * (overlap_end - current) as f64 / 60.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const H: Minute = 60;

    fn tier(start_h: Minute, end_h: Minute, rate: f64) -> RateTier {
        RateTier {
            start: start_h * H,
            end: end_h * H,
            rate_per_hour: rate,
        }
    }

    fn clubhouse() -> PricingPolicy {
        PricingPolicy::Tiered {
            tiers: vec![tier(10, 16, 100.0), tier(16, 22, 500.0)],
        }
    }

    fn hours(start_h: Minute, end_h: Minute) -> TimeInterval {
        TimeInterval::new(start_h * H, end_h * H)
    }

    #[test]
    fn flat_rate_scales_with_duration() {
        let tennis = PricingPolicy::Flat { rate_per_hour: 50.0 };
        assert_eq!(price(&tennis, &hours(16, 20)), 200.0);
        assert_eq!(price(&tennis, &TimeInterval::new(600, 630)), 25.0);
    }

    #[test]
    fn tiered_single_tier_exact() {
        assert_eq!(price(&clubhouse(), &hours(16, 22)), 3000.0);
    }

    #[test]
    fn tiered_spanning_two_tiers() {
        assert_eq!(price(&clubhouse(), &hours(14, 18)), 1200.0);
    }

    #[test]
    fn tiered_trailing_gap_is_free() {
        // 20:00-24:00: two hours at 500, then nothing covers 22:00-24:00.
        assert_eq!(price(&clubhouse(), &hours(20, 24)), 1000.0);
    }

    #[test]
    fn tiered_interval_outside_every_tier_costs_nothing() {
        let policy = PricingPolicy::Tiered {
            tiers: vec![tier(10, 16, 100.0)],
        };
        assert_eq!(price(&policy, &hours(18, 20)), 0.0);
        assert!(quote(&policy, &hours(18, 20)).segments.is_empty());
    }

    #[test]
    fn tiered_leading_gap_billed_at_next_tier_rate() {
        let policy = PricingPolicy::Tiered {
            tiers: vec![tier(10, 16, 100.0)],
        };
        // 08:00-12:00: walk starts at 08:00 and the first match is [10,16).
        assert_eq!(price(&policy, &hours(8, 12)), 400.0);
    }

    #[test]
    fn tiered_inner_gap_billed_at_following_tier() {
        let policy = PricingPolicy::Tiered {
            tiers: vec![tier(8, 10, 10.0), tier(12, 14, 20.0)],
        };
        // 09-10 @10, then 10-14 matched by [12,14) @20.
        let q = quote(&policy, &hours(9, 14));
        assert_eq!(q.segments.len(), 2);
        assert_eq!(q.segments[0].interval, hours(9, 10));
        assert_eq!(q.segments[1].interval, hours(10, 14));
        assert_eq!(q.total, 10.0 + 80.0);
    }

    #[test]
    fn first_matching_tier_wins_over_cheaper_one() {
        // Overlapping tiers are a catalog error, but the walk still must be deterministic.
        let policy = PricingPolicy::Tiered {
            tiers: vec![tier(10, 20, 300.0), tier(10, 20, 1.0)],
        };
        assert_eq!(price(&policy, &hours(12, 14)), 600.0);
    }

    #[test]
    fn tier_order_not_start_order() {
        let policy = PricingPolicy::Tiered {
            tiers: vec![tier(14, 18, 200.0), tier(10, 14, 100.0)],
        };
        // At 12:00 the first tier in sequence overlapping [12,16) is [14,18).
        let q = quote(&policy, &hours(12, 16));
        assert_eq!(q.segments.len(), 1);
        assert_eq!(q.segments[0].rate_per_hour, 200.0);
        assert_eq!(q.total, 800.0);
    }

    #[test]
    fn quote_matches_price_and_itemizes() {
        let q = quote(&clubhouse(), &hours(14, 18));
        assert_eq!(q.total, 1200.0);
        assert_eq!(
            q.segments,
            vec![
                PricedSegment {
                    interval: hours(14, 16),
                    rate_per_hour: 100.0,
                    cost: 200.0
                },
                PricedSegment {
                    interval: hours(16, 18),
                    rate_per_hour: 500.0,
                    cost: 1000.0
                },
            ]
        );
    }

    #[test]
    fn empty_tier_list_is_free() {
        let policy = PricingPolicy::Tiered { tiers: vec![] };
        assert_eq!(price(&policy, &hours(0, 24)), 0.0);
    }

    #[test]
    fn malformed_tier_still_terminates() {
        // start >= end never passes catalog validation; the walk must not spin on it.
        let policy = PricingPolicy::Tiered {
            tiers: vec![RateTier {
                start: 900,
                end: 600,
                rate_per_hour: 60.0,
            }],
        };
        let q = quote(&policy, &TimeInterval::new(500, 1000));
        assert_eq!(q.segments.len(), 1);
        assert_eq!(q.segments[0].interval, TimeInterval::new(500, 600));
    }

    fn interval_strategy() -> impl Strategy<Value = (Minute, Minute, Minute)> {
        (0u32..1438).prop_flat_map(|s| (Just(s), (s + 1)..1439)).prop_flat_map(|(s, m)| (Just(s), Just(m), (m + 1)..=1440))
    }

    proptest! {
        #[test]
        fn flat_is_linear_and_additive((s, m, e) in interval_strategy(), rate in 0.0f64..1000.0) {
            let policy = PricingPolicy::Flat { rate_per_hour: rate };
            let whole = price(&policy, &TimeInterval::new(s, e));
            let expected = rate * (e - s) as f64 / 60.0;
            prop_assert!((whole - expected).abs() < 1e-9);
            let split = price(&policy, &TimeInterval::new(s, m)) + price(&policy, &TimeInterval::new(m, e));
            prop_assert!((whole - split).abs() < 1e-6);
        }

        #[test]
        fn tiered_segments_are_contiguous_and_within_interval((s, _m, e) in interval_strategy()) {
            let q = quote(&clubhouse(), &TimeInterval::new(s, e));
            let mut cursor = s;
            for seg in &q.segments {
                prop_assert_eq!(seg.interval.start, cursor);
                prop_assert!(seg.interval.end <= e);
                prop_assert!(seg.cost >= 0.0);
                cursor = seg.interval.end;
            }
            prop_assert!((q.total - price(&clubhouse(), &TimeInterval::new(s, e))).abs() < 1e-9);
        }
    }
}
