use plib_core::constants::JOB_SLAB_BLOCK;
use plib_core::{Barrier, CoordError};
use plib_runtime::{PoolConfig, PoolJob, ThreadPool};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Poll `cond` until it holds or five seconds pass
fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn test_two_threads_five_jobs() {
    let pool = ThreadPool::with_limits(0, 2).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Barrier::new(5));

    for _ in 0..5 {
        let counter = Arc::clone(&counter);
        let done = Arc::clone(&done);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            done.signal();
        })
        .unwrap();
        assert!(pool.stats().live_threads <= 2);
    }

    done.wait();
    assert_eq!(counter.load(Ordering::SeqCst), 5);

    let stats = pool.stats();
    assert!(stats.live_threads <= 2);
    assert!(stats.peak_threads <= 2);
    assert!(stats.peak_threads >= 1);
    assert_eq!(stats.jobs_submitted, 5);
}

#[test]
fn test_fifo_per_submitter() {
    // One worker runs jobs strictly in queue order
    let pool = ThreadPool::with_limits(0, 1).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(Barrier::new(50));

    for i in 0..50 {
        let order = Arc::clone(&order);
        let done = Arc::clone(&done);
        pool.submit(move || {
            order.lock().unwrap().push(i);
            done.signal();
        })
        .unwrap();
    }

    done.wait();
    let order = order.lock().unwrap();
    assert_eq!(*order, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_every_job_runs_once() {
    let pool = Arc::new(ThreadPool::new(PoolConfig::new().name("many").max_threads(4)).unwrap());
    let hits: Arc<Vec<AtomicUsize>> = Arc::new((0..400).map(|_| AtomicUsize::new(0)).collect());
    let done = Arc::new(Barrier::new(400));

    let submitters: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let hits = Arc::clone(&hits);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..100 {
                    let hits = Arc::clone(&hits);
                    let done = Arc::clone(&done);
                    pool.submit(move || {
                        hits[t * 100 + i].fetch_add(1, Ordering::SeqCst);
                        done.signal();
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for s in submitters {
        s.join().unwrap();
    }
    done.wait();

    assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    assert!(pool.stats().peak_threads <= 4);
}

#[test]
fn test_submit_fn_and_job_object() {
    struct Counted {
        runs: AtomicUsize,
        done: Barrier,
    }

    impl PoolJob for Counted {
        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.done.signal();
        }
    }

    fn signal(b: Arc<Barrier>) {
        b.signal();
    }

    let pool = ThreadPool::with_limits(0, 2).unwrap();

    let job = Arc::new(Counted {
        runs: AtomicUsize::new(0),
        done: Barrier::new(1),
    });
    pool.submit_job(job.clone()).unwrap();
    job.done.wait();

    let b = Arc::new(Barrier::new(1));
    pool.submit_fn(signal, Arc::clone(&b)).unwrap();
    b.wait();

    pool.shutdown().unwrap();
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    // Pool released its reference once the job ran
    assert_eq!(Arc::strong_count(&job), 1);
    assert_eq!(pool.stats().descriptors_active, 0);
}

#[test]
fn test_shutdown_drains_and_restores() {
    let pool = ThreadPool::with_limits(0, 3).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    pool.shutdown().unwrap();
    let stats = pool.stats();
    assert_eq!(stats.live_threads, 0);
    assert_eq!(stats.idle_threads, 0);
    assert_eq!(stats.max_threads, 3);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.jobs_completed + stats.jobs_abandoned, 100);
    assert_eq!(counter.load(Ordering::SeqCst) as u64, stats.jobs_completed);

    // Pool is usable again after shutdown
    let done = Arc::new(Barrier::new(1));
    let d = Arc::clone(&done);
    pool.submit(move || d.signal()).unwrap();
    done.wait();
    pool.shutdown().unwrap();
    assert_eq!(pool.stats().live_threads, 0);
}

#[test]
fn test_queued_jobs_abandoned_at_shutdown() {
    let pool = ThreadPool::with_limits(0, 2).unwrap();
    pool.set_max_threads(0);

    // No room for a worker, so the job can only sit in the queue
    let ran = Arc::new(AtomicBool::new(false));
    let r = Arc::clone(&ran);
    pool.submit(move || r.store(true, Ordering::SeqCst)).unwrap();
    assert_eq!(pool.stats().queued, 1);
    assert_eq!(pool.stats().live_threads, 0);

    pool.shutdown().unwrap();

    let stats = pool.stats();
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(stats.jobs_abandoned, 1);
    assert_eq!(stats.jobs_completed, 0);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.queue_high_water, 1);
    assert_eq!(stats.descriptors_active, 0);
    // The closure and its captures were dropped
    assert_eq!(Arc::strong_count(&ran), 1);
}

#[test]
fn test_concurrent_shutdowns_restore_ceiling() {
    let pool = Arc::new(ThreadPool::with_limits(0, 2).unwrap());
    let (release_tx, release_rx) = mpsc::channel::<()>();

    // Keep one worker busy so both shutdowns have to wait
    pool.submit(move || {
        release_rx.recv().unwrap();
    })
    .unwrap();

    let stoppers: Vec<_> = (0..2)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown().unwrap())
        })
        .collect();

    assert!(wait_until(|| pool.stats().shutdowns_in_progress == 2));
    assert_eq!(pool.max_threads(), 0);

    release_tx.send(()).unwrap();
    for s in stoppers {
        s.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.shutdowns_in_progress, 0);
    assert_eq!(stats.live_threads, 0);
    assert_eq!(stats.max_threads, 2);

    // Still accepts and runs work
    let done = Arc::new(Barrier::new(1));
    let d = Arc::clone(&done);
    pool.submit(move || d.signal()).unwrap();
    done.wait();
}

#[test]
fn test_ceiling_set_during_shutdown_applies_after() {
    let pool = Arc::new(ThreadPool::with_limits(0, 2).unwrap());
    let (release_tx, release_rx) = mpsc::channel::<()>();

    pool.submit(move || {
        release_rx.recv().unwrap();
    })
    .unwrap();

    let stopper = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.shutdown().unwrap())
    };
    assert!(wait_until(|| pool.stats().shutdowns_in_progress == 1));

    pool.set_max_threads(5);
    assert_eq!(pool.max_threads(), 0);

    release_tx.send(()).unwrap();
    stopper.join().unwrap();
    assert_eq!(pool.max_threads(), 5);
}

#[test]
fn test_descriptor_slots_recycled() {
    let pool = ThreadPool::with_limits(0, 1).unwrap();

    for _ in 0..(JOB_SLAB_BLOCK * 3) {
        let done = Arc::new(Barrier::new(1));
        let d = Arc::clone(&done);
        pool.submit(move || d.signal()).unwrap();
        done.wait();
    }

    // At most one job in flight at a time, so one block is enough
    let stats = pool.stats();
    assert_eq!(stats.descriptor_slots, JOB_SLAB_BLOCK);
    assert_eq!(stats.descriptors_active, 0);
}

#[test]
fn test_idle_pool_shutdown() {
    let pool = ThreadPool::with_limits(0, 2).unwrap();
    let done = Arc::new(Barrier::new(2));
    for _ in 0..2 {
        let d = Arc::clone(&done);
        pool.submit(move || d.signal()).unwrap();
    }
    done.wait();

    // Workers park once the queue is empty
    assert!(wait_until(|| {
        let s = pool.stats();
        s.idle_threads == s.live_threads
    }));

    pool.shutdown().unwrap();
    assert_eq!(pool.stats().live_threads, 0);
}

#[test]
fn test_panicking_job_keeps_worker() {
    let pool = ThreadPool::with_limits(0, 1).unwrap();

    pool.submit(|| panic!("intentional panic for testing")).unwrap();

    let done = Arc::new(Barrier::new(1));
    let d = Arc::clone(&done);
    pool.submit(move || d.signal()).unwrap();
    done.wait();

    pool.shutdown().unwrap();
    let stats = pool.stats();
    assert_eq!(stats.jobs_panicked, 1);
    assert_eq!(stats.jobs_completed, 1);
    // Never needed a second thread
    assert_eq!(stats.peak_threads, 1);
}

#[test]
fn test_shutdown_from_worker_is_refused() {
    let pool = Arc::new(ThreadPool::with_limits(0, 1).unwrap());
    let (tx, rx) = mpsc::channel();

    let inner = Arc::clone(&pool);
    pool.submit(move || {
        let refused = matches!(inner.shutdown(), Err(CoordError::ShutdownFromWorker));
        tx.send(refused).unwrap();
    })
    .unwrap();

    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    pool.shutdown().unwrap();
    assert_eq!(pool.stats().live_threads, 0);
}

#[test]
fn test_lowering_ceiling_shrinks_idle_workers() {
    let pool = ThreadPool::with_limits(0, 4).unwrap();
    // All four jobs must be running at once before any finishes
    let together = Arc::new(Barrier::new(4));

    for _ in 0..4 {
        let t = Arc::clone(&together);
        pool.submit(move || t.signal_and_wait()).unwrap();
    }
    together.wait();

    assert!(wait_until(|| pool.stats().idle_threads == 4));
    assert_eq!(pool.stats().live_threads, 4);

    pool.set_max_threads(1);
    assert!(wait_until(|| pool.stats().live_threads == 1));
    assert_eq!(pool.max_threads(), 1);

    pool.shutdown().unwrap();
    assert_eq!(pool.stats().live_threads, 0);
    assert_eq!(pool.max_threads(), 1);
}

#[test]
fn test_drop_waits_for_workers() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    {
        let pool = ThreadPool::with_limits(0, 2).unwrap();
        for _ in 0..10 {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            pool.submit(move || {
                started.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
    }
    // No job is still running once drop has returned
    assert!(started.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        started.load(Ordering::SeqCst),
        finished.load(Ordering::SeqCst)
    );
}
