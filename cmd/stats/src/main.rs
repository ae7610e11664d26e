//! Stat snapshot example
//!
//! Worker threads count into their own local stats and checkpoint once per
//! loop iteration. The main thread is the monitor: it takes a snapshot at a
//! fixed interval and prints the merged totals.
//!
//! # Environment Variables
//!
//! - `PLIB_LOG_LEVEL=debug` - Set log level
//! - `PLIB_STATS_WORKERS=<n>` - Worker threads (default 4)
//! - `PLIB_STATS_ROUNDS=<n>` - Snapshots to take (default 5)
//! - `PLIB_STATS_INTERVAL_MS=<ms>` - Time between snapshots (default 100)

use plib::{env_get, spawn_thread, CoordResult, Snapshot, Stat, StatRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

fn worker(id: usize, registry: Arc<StatRegistry>, stop: Arc<AtomicBool>) -> CoordResult<()> {
    let me = registry.register_thread()?;
    let requests = me.register_local("requests");
    let latency = me.register_local("latency_us");
    let loops = registry.register_global("loops");
    debug!(worker = id, "registered");

    let mut n: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let start = Instant::now();
        // Stand-in for real work
        std::thread::sleep(Duration::from_micros(200 + 50 * id as u64));
        n += 1;

        requests.inc();
        latency.sum(start.elapsed().as_micros() as i64);
        loops.inc();

        me.checkpoint();
    }

    info!(worker = id, iterations = n, "worker done");
    Ok(())
}

fn print_snapshot(round: usize, snap: &Snapshot) {
    println!("--- snapshot {} ---", round);
    for e in snap {
        let avg = if e.count > 0 { e.sum / e.count } else { 0 };
        println!("  [{}] {:<12} sum={:<10} count={:<8} avg={}", e.id, e.name, e.sum, e.count, avg);
    }
}

// PLIB_LOG_LEVEL=debug cargo run -p plib-stats
fn main() -> CoordResult<()> {
    println!("=== plib Stats Example ===\n");

    plib::init_logging();

    let workers: usize = env_get("PLIB_STATS_WORKERS", 4);
    let rounds: usize = env_get("PLIB_STATS_ROUNDS", 5);
    let interval = Duration::from_millis(env_get("PLIB_STATS_INTERVAL_MS", 100));

    let registry = Arc::new(StatRegistry::new());
    let stop = Arc::new(AtomicBool::new(false));

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let registry = Arc::clone(&registry);
        let stop = Arc::clone(&stop);
        handles.push(spawn_thread(format!("stats-worker-{}", id), 0, move || {
            worker(id, registry, stop)
        })?);
    }

    for round in 1..=rounds {
        std::thread::sleep(interval);
        let started = Instant::now();
        let snap = registry.snapshot()?;
        info!(round, waited_us = started.elapsed().as_micros() as u64, "snapshot taken");
        print_snapshot(round, &snap);
    }

    stop.store(true, Ordering::Relaxed);
    for h in handles {
        match h.join() {
            Ok(result) => result?,
            Err(_) => tracing::error!("worker panicked"),
        }
    }

    // Workers have retired; their totals remain
    let last = registry.snapshot()?;
    print_snapshot(rounds + 1, &last);

    println!("\n=== Example Complete ===");
    Ok(())
}
