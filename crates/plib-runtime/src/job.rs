//! Job definitions and dispatch
//!
//! A pool accepts two kinds of work:
//!
//! - a closure (the callable together with its captured argument), stored
//!   in a pool-owned descriptor drawn from the pool's slab;
//! - a caller-owned object implementing [`PoolJob`], queued by `Arc` and
//!   never recycled by the pool.
//!
//! The worker resolves a queued [`Job`] into a [`Dispatch`] while holding
//! the pool lock (releasing the descriptor immediately), then runs the
//! dispatch with the lock dropped.

use std::sync::Arc;

use plib_core::id::SlabHandle;
use plib_core::slab::SlabAllocator;

/// Work object submitted by reference; the caller keeps ownership
///
/// The same object must not be queued again until its previous `run()` has
/// been dispatched.
pub trait PoolJob: Send + Sync {
    fn run(&self);
}

/// Boxed closure held in a slab descriptor
pub(crate) type Callable = Box<dyn FnOnce() + Send + 'static>;

/// Entry sitting in the work queue
pub(crate) enum Job {
    /// Pool-owned descriptor in the job slab
    Call(SlabHandle),
    /// Caller-owned object
    Task(Arc<dyn PoolJob>),
}

/// Job resolved out of the queue, ready to run without the lock
pub(crate) enum Dispatch {
    Call(Callable),
    Task(Arc<dyn PoolJob>),
}

impl Job {
    /// Resolve into something runnable, releasing the descriptor
    ///
    /// Returns `None` only if a descriptor was lost, which would mean the
    /// same handle was queued twice.
    pub(crate) fn into_dispatch(self, slab: &mut SlabAllocator<Callable>) -> Option<Dispatch> {
        match self {
            Job::Call(handle) => slab.release(handle).map(Dispatch::Call),
            Job::Task(task) => Some(Dispatch::Task(task)),
        }
    }
}

impl Dispatch {
    pub(crate) fn run(self) {
        match self {
            Dispatch::Call(f) => f(),
            Dispatch::Task(task) => task.run(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Dispatch::Call(_) => "call",
            Dispatch::Task(_) => "task",
        }
    }
}
