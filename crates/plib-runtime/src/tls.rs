//! Thread-local worker identity
//!
//! Lets pool code ask "am I running on one of this pool's workers?"
//! without taking the pool lock.

use std::cell::Cell;

/// Which pool and worker slot the current OS thread belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerIdentity {
    /// Process-unique pool id
    pub pool_id: u64,
    /// Sequence number of the worker within its pool
    pub index: usize,
}

thread_local! {
    static CURRENT_WORKER: Cell<Option<WorkerIdentity>> = const { Cell::new(None) };
}

/// Mark the current thread as a pool worker
#[inline]
pub(crate) fn set_current_worker(identity: WorkerIdentity) {
    CURRENT_WORKER.with(|cell| cell.set(Some(identity)));
}

/// Clear the marker (worker leaving its loop)
#[inline]
pub(crate) fn clear_current_worker() {
    CURRENT_WORKER.with(|cell| cell.set(None));
}

/// Identity of the current thread, `None` if it is not a pool worker
#[inline]
pub fn current_worker() -> Option<WorkerIdentity> {
    CURRENT_WORKER.with(|cell| cell.get())
}

/// Check if the current thread is a worker of pool `pool_id`
#[inline]
pub fn is_worker_of(pool_id: u64) -> bool {
    current_worker().is_some_and(|w| w.pool_id == pool_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_per_thread() {
        assert!(current_worker().is_none());

        set_current_worker(WorkerIdentity { pool_id: 9, index: 2 });
        assert!(is_worker_of(9));
        assert!(!is_worker_of(10));

        std::thread::spawn(|| {
            assert!(current_worker().is_none());
        })
        .join()
        .unwrap();

        clear_current_worker();
        assert!(current_worker().is_none());
    }
}
