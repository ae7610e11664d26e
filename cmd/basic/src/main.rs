//! Basic thread pool example
//!
//! Submits a batch of jobs to a small pool, waits on a completion barrier,
//! then shuts the pool down and prints its counters.
//!
//! # Environment Variables
//!
//! - `PLIB_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `PLIB_POOL_BASIC_MAX_THREADS=<n>` - Thread ceiling for this pool (default 2)
//! - `PLIB_POOL_BASIC_STACK_SIZE=<bytes>` - Worker stack size

use plib::{env_get_str, Barrier, CoordResult, PoolConfig, PoolJob, ThreadPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const JOBS: usize = 5;

/// Job object the caller keeps ownership of
struct Announce {
    runs: AtomicUsize,
    done: Arc<Barrier>,
}

impl PoolJob for Announce {
    fn run(&self) {
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        info!(worker = ?plib::current_worker(), runs = n, "job object ran");
        self.done.signal();
    }
}

/// Plain function job: `submit_fn` pairs it with its argument
fn greet((msg, done): (String, Arc<Barrier>)) {
    println!("{}", msg);
    done.signal();
}

// PLIB_LOG_LEVEL=debug cargo run -p plib-basic
fn main() -> CoordResult<()> {
    println!("=== plib Basic Example ===\n");

    plib::init_logging();

    let mut config = PoolConfig::from_env_named("basic");
    if !plib::env_is_set("PLIB_POOL_BASIC_MAX_THREADS")
        && !plib::env_is_set("PLIB_POOL_MAX_THREADS")
    {
        config = config.max_threads(2);
    }
    config.print();
    let pool = ThreadPool::new(config)?;

    let counter = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Barrier::new(JOBS + 2));

    for i in 0..JOBS {
        let counter = Arc::clone(&counter);
        let done = Arc::clone(&done);
        pool.submit(move || {
            debug!(job = i, "closure job started");
            counter.fetch_add(1, Ordering::SeqCst);
            done.signal();
        })?;
    }

    let announce = Arc::new(Announce {
        runs: AtomicUsize::new(0),
        done: Arc::clone(&done),
    });
    pool.submit_job(announce.clone())?;

    let greeting = env_get_str("PLIB_BASIC_GREETING", "hello from a plain fn job");
    pool.submit_fn(greet, (greeting, Arc::clone(&done)))?;

    println!("Waiting for {} jobs...\n", JOBS + 2);
    done.wait();
    done.destroy()?;

    let stats = pool.stats();
    println!("\ncounter          = {}", counter.load(Ordering::SeqCst));
    println!("job object runs  = {}", announce.runs.load(Ordering::SeqCst));
    println!("peak threads     = {} (max {})", stats.peak_threads, stats.max_threads);

    pool.shutdown()?;
    let stats = pool.stats();
    println!("after shutdown   : live={} completed={} abandoned={}",
        stats.live_threads, stats.jobs_completed, stats.jobs_abandoned);

    println!("\n=== Example Complete ===");
    Ok(())
}
