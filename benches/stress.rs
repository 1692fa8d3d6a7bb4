use std::sync::Arc;
use std::time::{Duration, Instant};

use slotbook::catalog::Catalog;
use slotbook::engine::{Engine, EngineError};
use slotbook::model::*;

const FACILITIES: usize = 20;
const DAYS: usize = 30;
const CLIENTS: usize = 64;
const REQUESTS_PER_CLIENT: usize = 500;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

/// Half flat, half tiered with three day-parts.
fn catalog() -> Catalog {
    let facilities = (0..FACILITIES)
        .map(|i| Facility {
            name: format!("facility-{i}"),
            pricing: if i % 2 == 0 {
                PricingPolicy::Flat { rate_per_hour: 40.0 }
            } else {
                PricingPolicy::Tiered {
                    tiers: vec![
                        RateTier { start: 360, end: 720, rate_per_hour: 60.0 },
                        RateTier { start: 720, end: 1080, rate_per_hour: 90.0 },
                        RateTier { start: 1080, end: 1380, rate_per_hour: 150.0 },
                    ],
                }
            },
        })
        .collect();
    Catalog::new(facilities).expect("bench catalog is valid")
}

/// Cheap deterministic generator so runs are comparable.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

#[derive(Default)]
struct ClientStats {
    booked: Vec<Duration>,
    conflicts: Vec<Duration>,
}

async fn client(engine: Arc<Engine>, seed: u64) -> ClientStats {
    let mut rng = XorShift(seed | 1);
    let mut stats = ClientStats::default();
    for _ in 0..REQUESTS_PER_CLIENT {
        let facility = format!("facility-{}", rng.below(FACILITIES as u64));
        let date = format!("2025-01-{:02}", 1 + rng.below(DAYS as u64));
        let start = (rng.below(46) * 30) as Minute;
        let len = (1 + rng.below(4)) as Minute * 30;
        let interval = TimeInterval::new(start, (start + len).min(1440));

        let t = Instant::now();
        match engine.book_interval(&facility, &date, interval).await {
            Ok(_) => stats.booked.push(t.elapsed()),
            Err(EngineError::Conflict(_)) => stats.conflicts.push(t.elapsed()),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    stats
}

#[tokio::main]
async fn main() {
    println!("slotbook stress: {CLIENTS} clients x {REQUESTS_PER_CLIENT} requests, {FACILITIES} facilities x {DAYS} days");
    let engine = Arc::new(Engine::in_memory(Arc::new(catalog())));

    let started = Instant::now();
    let handles: Vec<_> = (0..CLIENTS)
        .map(|i| tokio::spawn(client(engine.clone(), 0x9E37_79B9_7F4A_7C15 ^ i as u64)))
        .collect();

    let mut booked = Vec::new();
    let mut conflicts = Vec::new();
    for h in handles {
        let stats = h.await.expect("client task panicked");
        booked.extend(stats.booked);
        conflicts.extend(stats.conflicts);
    }
    let elapsed = started.elapsed();

    let total = booked.len() + conflicts.len();
    println!(
        "  {total} requests in {:.2}s ({:.0} req/s)",
        elapsed.as_secs_f64(),
        total as f64 / elapsed.as_secs_f64()
    );
    print_latency("booked", &mut booked);
    print_latency("conflict", &mut conflicts);

    // Every bucket must still be overlap-free.
    let mut checked = 0;
    for f in 0..FACILITIES {
        for d in 0..DAYS {
            let bookings = engine
                .bookings(&format!("facility-{f}"), &format!("2025-01-{:02}", d + 1))
                .await
                .expect("facility exists");
            for (i, a) in bookings.iter().enumerate() {
                for b in &bookings[i + 1..] {
                    assert!(!a.interval.overlaps(&b.interval), "overlap in facility-{f} day {d}");
                }
            }
            checked += bookings.len();
        }
    }
    assert_eq!(checked, booked.len());
    println!("  invariant holds across {checked} stored bookings");
}
