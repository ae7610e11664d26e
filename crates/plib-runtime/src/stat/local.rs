//! Per-thread stat participants

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use plib_core::id::StatId;
use tracing::debug;

use super::registry::{RegistryState, StatRegistry};
use super::snapshot::Snapshot;
use super::{accumulate, Stat, Totals};

struct LocalCell {
    id: StatId,
    sum: Cell<i64>,
    count: Cell<i64>,
}

/// Stats owned by one thread; only that thread reads or writes them
type Arena = Rc<RefCell<Vec<LocalCell>>>;

/// A thread's membership in a [`StatRegistry`]
///
/// Not `Send`: the arena it owns is read without synchronization, so the
/// handle must stay on the thread that registered. Call
/// [`checkpoint`](Self::checkpoint) from the thread's loop; a participant
/// that never checkpoints blocks every snapshot.
pub struct ThreadStats {
    registry: Arc<StatRegistry>,
    key: u64,
    arena: Arena,
    /// Serial of the last snapshot this thread folded into
    seen: Cell<u64>,
}

impl ThreadStats {
    pub(crate) fn new(registry: Arc<StatRegistry>, key: u64, serial: u64) -> Self {
        Self {
            registry,
            key,
            arena: Rc::new(RefCell::new(Vec::new())),
            seen: Cell::new(serial),
        }
    }

    pub fn registry(&self) -> &Arc<StatRegistry> {
        &self.registry
    }

    /// Register a stat in this thread's arena
    ///
    /// Each call creates a new cell; two cells under one name are merged by
    /// snapshots.
    pub fn register_local(&self, name: &str) -> LocalStat {
        let id = self.registry.intern(name);
        let mut cells = self.arena.borrow_mut();
        cells.push(LocalCell {
            id,
            sum: Cell::new(0),
            count: Cell::new(0),
        });
        LocalStat {
            arena: Rc::clone(&self.arena),
            slot: cells.len() - 1,
            id,
        }
    }

    /// Quiescence point; folds local stats if a snapshot is waiting on us
    ///
    /// Costs one atomic load when no snapshot is in flight. Returns `true`
    /// if this call contributed to a snapshot.
    pub fn checkpoint(&self) -> bool {
        if !self.registry.snapshot_requested() {
            return false;
        }
        let mut state = self.registry.lock();
        self.fold_locked(&mut state)
    }

    /// Snapshot from a participant thread
    ///
    /// Folds this thread's own stats directly and waits for the others.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.registry.lock();
        self.registry.collect(state, Some(self))
    }

    /// Fold into the pending snapshot if this thread is outstanding for it
    pub(crate) fn fold_locked(&self, state: &mut RegistryState) -> bool {
        if self.seen.get() == state.serial {
            return false;
        }
        let Some(pending) = state.pending.as_mut() else {
            return false;
        };

        self.fold_arena(pending);
        self.seen.set(state.serial);
        state.outstanding -= 1;
        if state.outstanding == 0 {
            self.registry.notify_folded();
        }
        true
    }

    pub(crate) fn fold_arena(&self, totals: &mut Vec<Totals>) {
        for cell in self.arena.borrow().iter() {
            accumulate(
                totals,
                cell.id,
                Totals {
                    sum: cell.sum.get(),
                    count: cell.count.get(),
                },
            );
        }
    }

    pub(crate) fn mark_seen(&self, serial: u64) {
        self.seen.set(serial);
    }
}

impl Drop for ThreadStats {
    /// Retire: totals move to the registry so later snapshots keep them
    fn drop(&mut self) {
        let registry = Arc::clone(&self.registry);
        let mut state = registry.lock();
        self.fold_locked(&mut state);
        self.fold_arena(&mut state.retired);
        state.threads.retain(|r| r.key != self.key);
        debug!(
            key = self.key,
            participants = state.threads.len(),
            "stat thread retired"
        );
    }
}

impl fmt::Debug for ThreadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadStats")
            .field("key", &self.key)
            .field("stats", &self.arena.borrow().len())
            .field("seen", &self.seen.get())
            .finish()
    }
}

/// Handle to a stat in a [`ThreadStats`] arena
///
/// Updates are plain cell writes. Not `Send`, like its participant.
/// Updates made after the participant is dropped are not reported.
pub struct LocalStat {
    arena: Arena,
    slot: usize,
    id: StatId,
}

impl LocalStat {
    /// Current `(sum, count)` as seen by the owning thread
    pub fn get(&self) -> (i64, i64) {
        let cells = self.arena.borrow();
        let cell = &cells[self.slot];
        (cell.sum.get(), cell.count.get())
    }
}

impl Stat for LocalStat {
    #[inline]
    fn id(&self) -> StatId {
        self.id
    }

    #[inline]
    fn sum(&self, v: i64) {
        let cells = self.arena.borrow();
        let cell = &cells[self.slot];
        cell.sum.set(cell.sum.get() + v);
        cell.count.set(cell.count.get() + 1);
    }

    #[inline]
    fn add(&self, v: i64) {
        let cells = self.arena.borrow();
        let cell = &cells[self.slot];
        cell.count.set(cell.count.get() + v);
    }
}

impl fmt::Debug for LocalStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sum, count) = self.get();
        f.debug_struct("LocalStat")
            .field("id", &self.id)
            .field("sum", &sum)
            .field("count", &count)
            .finish()
    }
}
