//! Thread pool
//!
//! Grows OS worker threads on demand up to `max_threads` and shrinks them
//! when the ceiling is lowered. One mutex guards the queue, the job slab and
//! the thread counts; two condition variables carry "work available" and
//! "all workers gone".
//!
//! Submission never blocks: if no idle worker exists and the ceiling is
//! reached, the job waits in an unbounded queue.
//!
//! # Shutdown
//!
//! `shutdown()` forces the ceiling to 0 and waits for every worker to exit.
//! Busy workers still take queued jobs before checking the ceiling, so the
//! queue normally drains. Jobs left queued once the last worker has exited
//! are abandoned: they are dropped without running and counted in
//! [`PoolStats::jobs_abandoned`].
//!
//! Overlapping shutdowns share one saved ceiling: the first saves it, the
//! last restores it. `set_max_threads` during a shutdown updates the saved
//! value.

use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use plib_core::constants::JOB_SLAB_BLOCK;
use plib_core::error::{CoordError, CoordResult};
use plib_core::slab::SlabAllocator;
use plib_core::state::WorkerState;
use tracing::{debug, error, trace, warn};

use crate::config::PoolConfig;
use crate::job::{Callable, Dispatch, Job, PoolJob};
use crate::queue::{FifoQueue, WorkQueue};
use crate::tls;
use crate::worker::{run_worker, spawn_thread};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Point-in-time view of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Worker threads currently started
    pub live_threads: usize,
    /// Workers parked waiting for work
    pub idle_threads: usize,
    /// Effective ceiling; 0 while a shutdown is in progress
    pub max_threads: usize,
    /// `shutdown()` calls still waiting for workers to exit
    pub shutdowns_in_progress: usize,
    /// Highest `live_threads` ever observed
    pub peak_threads: usize,
    /// Jobs waiting in the queue
    pub queued: usize,
    /// Longest the queue has ever been
    pub queue_high_water: usize,
    /// Closure descriptors currently allocated from the slab
    pub descriptors_active: usize,
    /// Descriptor slots owned by the slab, free or not
    pub descriptor_slots: usize,
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    pub jobs_panicked: u64,
    pub jobs_abandoned: u64,
}

/// Mutable pool state, guarded by `PoolShared::state`
struct PoolState {
    queue: Box<dyn WorkQueue<Job>>,
    slab: SlabAllocator<Callable>,
    live: usize,
    idle: usize,
    max: usize,
    /// Ceiling to restore when the last overlapping shutdown finishes
    saved_max: Option<usize>,
    shutdowns: usize,
    peak: usize,
    submitted: u64,
    abandoned: u64,
}

/// State shared between the pool handle and its workers
pub(crate) struct PoolShared {
    id: u64,
    name: String,
    stack_size: usize,
    state: Mutex<PoolState>,
    /// Signalled when work is queued or the ceiling drops
    work_available: Condvar,
    /// Signalled when `live` reaches 0
    drained: Condvar,
    /// Worker index sequence
    spawned: AtomicUsize,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl PoolShared {
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Next job for a worker, or `None` when the worker must exit
    ///
    /// Returning `None` has already removed the worker from `live`.
    /// `phase` follows the worker through `Running`, `Idle` and `Exiting`.
    pub(crate) fn next_job(&self, worker: usize, phase: &mut WorkerState) -> Option<Dispatch> {
        let mut state = self.lock();
        loop {
            if let Some(job) = state.queue.dequeue() {
                match job.into_dispatch(&mut state.slab) {
                    Some(dispatch) => {
                        self.enter(worker, phase, WorkerState::Running);
                        return Some(dispatch);
                    }
                    None => {
                        error!(pool = %self.name, worker, "queued job lost its descriptor");
                        continue;
                    }
                }
            }

            if state.idle + 1 > state.max {
                break;
            }

            self.enter(worker, phase, WorkerState::Idle);
            state.idle += 1;
            trace!(pool = %self.name, worker, idle = state.idle, "worker idle");
            state = self
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.idle -= 1;

            if state.idle + 1 > state.max {
                break;
            }
        }

        self.enter(worker, phase, WorkerState::Exiting);
        state.live -= 1;
        trace!(pool = %self.name, worker, live = state.live, "worker leaving");
        if state.idle > 0 {
            // Pass the exit check along to the next parked worker
            self.work_available.notify_one();
        }
        if state.live == 0 {
            self.drained.notify_all();
        }
        None
    }

    fn enter(&self, worker: usize, phase: &mut WorkerState, next: WorkerState) {
        let from = *phase;
        if from == next {
            return;
        }
        debug_assert!(from.can_transition_to(next), "worker {} -> {}", from, next);
        trace!(pool = %self.name, worker, from = %from, to = %next, "worker state");
        *phase = next;
    }
}

/// Pool of on-demand worker threads
pub struct ThreadPool {
    shared: Arc<PoolShared>,
}

impl ThreadPool {
    /// Create a pool. No thread is started until the first submission.
    pub fn new(config: PoolConfig) -> CoordResult<Self> {
        config.validate()?;

        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            pool = %config.name,
            id,
            max_threads = config.max_threads,
            stack_size = config.stack_size,
            "pool created"
        );

        let state = PoolState {
            queue: Box::new(FifoQueue::new()),
            slab: SlabAllocator::with_block_size(JOB_SLAB_BLOCK),
            live: 0,
            idle: 0,
            max: config.max_threads,
            saved_max: None,
            shutdowns: 0,
            peak: 0,
            submitted: 0,
            abandoned: 0,
        };

        Ok(Self {
            shared: Arc::new(PoolShared {
                id,
                name: config.name,
                stack_size: config.stack_size,
                state: Mutex::new(state),
                work_available: Condvar::new(),
                drained: Condvar::new(),
                spawned: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                panicked: AtomicU64::new(0),
            }),
        })
    }

    /// Pool with the default name and explicit limits
    pub fn with_limits(stack_size: usize, max_threads: usize) -> CoordResult<Self> {
        Self::new(
            PoolConfig::new()
                .stack_size(stack_size)
                .max_threads(max_threads),
        )
    }

    /// Queue a closure. Its descriptor comes from the pool's job slab.
    ///
    /// Only the descriptor slot is recycled; boxing the closure still goes
    /// through the global allocator.
    ///
    /// # Errors
    ///
    /// [`CoordError::Spawn`] if a worker thread was needed but could not be
    /// started. The job is queued all the same and runs once a worker
    /// exists; do not submit it again.
    pub fn submit<F>(&self, f: F) -> CoordResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.lock();
        let handle = state.slab.allocate(Box::new(f));
        self.enqueue(state, Job::Call(handle))
    }

    /// Queue `start(arg)`
    pub fn submit_fn<A>(&self, start: fn(A), arg: A) -> CoordResult<()>
    where
        A: Send + 'static,
    {
        self.submit(move || start(arg))
    }

    /// Queue a caller-owned job object
    ///
    /// The pool holds a clone of the `Arc` until the job has run.
    pub fn submit_job(&self, job: Arc<dyn PoolJob>) -> CoordResult<()> {
        let state = self.shared.lock();
        self.enqueue(state, Job::Task(job))
    }

    fn enqueue(&self, mut state: MutexGuard<'_, PoolState>, job: Job) -> CoordResult<()> {
        state.queue.enqueue(job);
        state.submitted += 1;

        if state.idle > 0 {
            self.shared.work_available.notify_one();
            return Ok(());
        }
        if state.live >= state.max {
            return Ok(());
        }

        state.live += 1;
        state.peak = state.peak.max(state.live);
        drop(state);
        self.start_worker()
    }

    /// Start one worker. `live` was already counted by the caller.
    fn start_worker(&self) -> CoordResult<()> {
        let index = self.shared.spawned.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let name = format!("{}-{}", self.shared.name, index);

        match spawn_thread(name, self.shared.stack_size, move || run_worker(shared, index)) {
            Ok(_detached) => Ok(()),
            Err(e) => Err(self.spawn_failed(e)),
        }
    }

    /// Undo the `live` count of a worker that never started
    fn spawn_failed(&self, e: io::Error) -> CoordError {
        let mut state = self.shared.lock();
        state.live -= 1;
        if state.live == 0 {
            self.shared.drained.notify_all();
        }
        error!(
            pool = %self.shared.name,
            error = %e,
            queued = state.queue.len(),
            "failed to start worker; job stays queued"
        );
        CoordError::Spawn(e)
    }

    /// Stop every worker and wait until none is left
    ///
    /// The previous ceiling is restored afterwards, so the pool can be
    /// used again. Must not be called from one of this pool's workers.
    pub fn shutdown(&self) -> CoordResult<()> {
        if tls::is_worker_of(self.shared.id) {
            return Err(CoordError::ShutdownFromWorker);
        }

        let mut state = self.shared.lock();
        if state.shutdowns == 0 {
            state.saved_max = Some(state.max);
        }
        state.shutdowns += 1;
        state.max = 0;
        debug!(
            pool = %self.shared.name,
            live = state.live,
            shutdowns = state.shutdowns,
            "shutdown started"
        );
        self.shared.work_available.notify_all();

        while state.live > 0 {
            state = self
                .shared
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.shutdowns -= 1;
        if state.shutdowns == 0 {
            state.max = state.saved_max.take().unwrap_or(0);
        }

        let mut leftovers = Vec::new();
        while let Some(job) = state.queue.dequeue() {
            leftovers.extend(job.into_dispatch(&mut state.slab));
        }
        let abandoned = leftovers.len();
        state.abandoned += abandoned as u64;
        drop(state);

        // Captured values may touch the pool when dropped; lock is released
        drop(leftovers);
        if abandoned > 0 {
            warn!(pool = %self.shared.name, abandoned, "shutdown abandoned queued jobs");
        }
        debug!(pool = %self.shared.name, "shutdown complete");
        Ok(())
    }

    /// Change the thread ceiling
    ///
    /// Idle workers above the new ceiling exit. Raising the ceiling does not
    /// start threads by itself; the next submissions do. During a shutdown
    /// the new ceiling takes effect once the last shutdown returns.
    pub fn set_max_threads(&self, n: usize) {
        let mut state = self.shared.lock();
        if state.shutdowns > 0 {
            debug!(pool = %self.shared.name, to = n, "max_threads deferred until shutdown ends");
            state.saved_max = Some(n);
            return;
        }
        debug!(pool = %self.shared.name, from = state.max, to = n, "max_threads changed");
        state.max = n;
        self.shared.work_available.notify_all();
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.lock();
        PoolStats {
            live_threads: state.live,
            idle_threads: state.idle,
            max_threads: state.max,
            shutdowns_in_progress: state.shutdowns,
            peak_threads: state.peak,
            queued: state.queue.len(),
            queue_high_water: state.queue.high_water(),
            descriptors_active: state.slab.active(),
            descriptor_slots: state.slab.capacity(),
            jobs_submitted: state.submitted,
            jobs_completed: self.shared.completed.load(Ordering::Relaxed),
            jobs_panicked: self.shared.panicked.load(Ordering::Relaxed),
            jobs_abandoned: state.abandoned,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Process-unique pool id (matches `tls::WorkerIdentity::pool_id`)
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Effective ceiling; 0 while a shutdown is in progress
    pub fn max_threads(&self) -> usize {
        self.shared.lock().max
    }

    pub fn stack_size(&self) -> usize {
        self.shared.stack_size
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(pool = %self.shared.name, error = %e, "pool dropped without shutdown");
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.shared.name)
            .field("id", &self.shared.id)
            .field("stats", &self.stats())
            .finish()
    }
}
