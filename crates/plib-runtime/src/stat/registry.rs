//! Stat registry and snapshot coordination
//!
//! One mutex guards the name table, the participant list and the state of
//! the snapshot in flight. Two condition variables carry the handshake:
//! `folded` wakes the snapshot taker as participants check in, `done` wakes
//! callers queued behind an in-flight snapshot.
//!
//! A snapshot runs in these steps, all under the registry lock except the
//! waits:
//!
//! 1. Wait until no other snapshot is in flight.
//! 2. Start from a zeroed array indexed by stat id, then merge global stats
//!    and the totals of retired participants.
//! 3. Bump the serial once and mark every other participant outstanding.
//! 4. Wait until every outstanding participant has folded its arena in at a
//!    checkpoint, then clear the request and wake queued callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use plib_core::error::{CoordError, CoordResult};
use plib_core::id::StatId;
use tracing::{debug, trace};

use super::local::ThreadStats;
use super::snapshot::Snapshot;
use super::{accumulate, Stat, Totals};

/// Atomic cell behind a [`GlobalStat`]
#[derive(Debug)]
struct GlobalCell {
    id: StatId,
    sum: AtomicI64,
    count: AtomicI64,
}

impl GlobalCell {
    fn totals(&self) -> Totals {
        Totals {
            sum: self.sum.load(Ordering::Relaxed),
            count: self.count.load(Ordering::Relaxed),
        }
    }
}

/// Process-wide stat updated with atomic adds
///
/// Cloning shares the same cell.
#[derive(Debug, Clone)]
pub struct GlobalStat {
    cell: Arc<GlobalCell>,
}

impl Stat for GlobalStat {
    #[inline]
    fn id(&self) -> StatId {
        self.cell.id
    }

    #[inline]
    fn sum(&self, v: i64) {
        self.cell.sum.fetch_add(v, Ordering::Relaxed);
        self.cell.count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn add(&self, v: i64) {
        self.cell.count.fetch_add(v, Ordering::Relaxed);
    }
}

/// Live participant entry
#[derive(Debug)]
pub(crate) struct Registration {
    pub(crate) key: u64,
    pub(crate) thread: ThreadId,
}

/// Registry state guarded by `StatRegistry::state`
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    /// Interned names, indexed by id
    names: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, StatId>,
    globals: Vec<Arc<GlobalCell>>,
    pub(crate) threads: Vec<Registration>,
    next_key: u64,
    /// Bumped once per snapshot that has to wait for participants
    pub(crate) serial: u64,
    /// Participants that still have to fold into `pending`
    pub(crate) outstanding: usize,
    /// Result being assembled by the snapshot in flight
    pub(crate) pending: Option<Vec<Totals>>,
    /// Totals left behind by dropped participants
    pub(crate) retired: Vec<Totals>,
}

impl RegistryState {
    fn intern(&mut self, name: &str) -> StatId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = StatId::new(self.names.len() as u32);
        let name: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&name));
        self.ids.insert(name, id);
        trace!(%id, name = %self.names[id.as_usize()], "stat interned");
        id
    }

    fn is_registered(&self, thread: ThreadId) -> bool {
        self.threads.iter().any(|r| r.thread == thread)
    }
}

/// Name table, global stats and snapshot coordinator
///
/// Shared by `Arc`; participants keep the registry alive.
#[derive(Debug, Default)]
pub struct StatRegistry {
    state: Mutex<RegistryState>,
    /// Set while a snapshot waits for participants; checked without the lock
    requested: AtomicBool,
    /// A participant folded its arena
    folded: Condvar,
    /// The snapshot in flight finished
    done: Condvar,
}

impl StatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn snapshot_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Signal the taker once the last outstanding participant has folded
    #[inline]
    pub(crate) fn notify_folded(&self) {
        self.folded.notify_all();
    }

    /// Id for `name`; equal names always map to the same id
    pub fn intern(&self, name: &str) -> StatId {
        self.lock().intern(name)
    }

    /// Number of distinct stat names
    pub fn len(&self) -> usize {
        self.lock().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name_of(&self, id: StatId) -> Option<Arc<str>> {
        self.lock().names.get(id.as_usize()).cloned()
    }

    /// Number of live participants
    pub fn participants(&self) -> usize {
        self.lock().threads.len()
    }

    /// Register a process-wide stat
    ///
    /// Registering the same name twice yields two cells that snapshots
    /// merge into one entry.
    pub fn register_global(&self, name: &str) -> GlobalStat {
        let mut state = self.lock();
        let id = state.intern(name);
        let cell = Arc::new(GlobalCell {
            id,
            sum: AtomicI64::new(0),
            count: AtomicI64::new(0),
        });
        state.globals.push(Arc::clone(&cell));
        GlobalStat { cell }
    }

    /// Make the calling thread a participant
    ///
    /// The returned handle must stay on this thread and call
    /// [`ThreadStats::checkpoint`] regularly; until it does, snapshots
    /// block. Dropping it retires the thread.
    pub fn register_thread(self: &Arc<Self>) -> CoordResult<ThreadStats> {
        let me = thread::current().id();
        let mut state = self.lock();
        if state.is_registered(me) {
            return Err(CoordError::AlreadyRegistered);
        }

        let key = state.next_key;
        state.next_key += 1;
        state.threads.push(Registration { key, thread: me });
        debug!(
            thread = ?me,
            participants = state.threads.len(),
            "stat thread registered"
        );

        // Not outstanding for a snapshot already in flight
        Ok(ThreadStats::new(Arc::clone(self), key, state.serial))
    }

    /// Snapshot from a thread that is not a participant
    ///
    /// Blocks until every participant has checkpointed. A participant
    /// thread must use [`ThreadStats::snapshot`] instead, otherwise it would
    /// wait on itself; this returns [`CoordError::RegisteredCaller`].
    pub fn snapshot(&self) -> CoordResult<Snapshot> {
        let me = thread::current().id();
        let state = self.lock();
        if state.is_registered(me) {
            return Err(CoordError::RegisteredCaller);
        }
        Ok(self.collect(state, None))
    }

    /// Run the snapshot protocol; `caller` is the taker's own participant
    pub(crate) fn collect(
        &self,
        mut state: MutexGuard<'_, RegistryState>,
        caller: Option<&ThreadStats>,
    ) -> Snapshot {
        while state.pending.is_some() {
            if let Some(me) = caller {
                // The snapshot in flight may be waiting on us
                me.fold_locked(&mut state);
            }
            state = self.done.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        let mut totals = vec![Totals::default(); state.names.len()];
        for cell in &state.globals {
            accumulate(&mut totals, cell.id, cell.totals());
        }
        for (i, t) in state.retired.iter().enumerate() {
            accumulate(&mut totals, StatId::new(i as u32), *t);
        }
        if let Some(me) = caller {
            me.fold_arena(&mut totals);
        }

        let others = state.threads.len() - usize::from(caller.is_some());
        if others > 0 {
            state.serial += 1;
            if let Some(me) = caller {
                me.mark_seen(state.serial);
            }
            state.outstanding = others;
            state.pending = Some(totals);
            self.requested.store(true, Ordering::Release);
            trace!(serial = state.serial, outstanding = others, "snapshot requested");

            while state.outstanding > 0 {
                state = self.folded.wait(state).unwrap_or_else(PoisonError::into_inner);
            }

            totals = state.pending.take().unwrap_or_default();
            self.requested.store(false, Ordering::Release);
            self.done.notify_all();
            trace!(serial = state.serial, "snapshot complete");
        }

        Snapshot::build(&state.names, &totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let reg = StatRegistry::new();
        let a = reg.intern("alpha");
        let b = reg.intern("beta");
        assert_eq!(a.as_u32(), 0);
        assert_eq!(b.as_u32(), 1);
        assert_eq!(reg.intern(&String::from("alpha")), a);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.name_of(b).as_deref(), Some("beta"));
        assert!(reg.name_of(StatId::new(9)).is_none());
    }

    #[test]
    fn test_global_semantics() {
        let reg = StatRegistry::new();
        let g = reg.register_global("g");
        g.sum(5);
        g.add(7);
        g.inc();
        g.dec();

        let snap = reg.snapshot().unwrap();
        let e = snap.get(g.id()).unwrap();
        assert_eq!((e.sum, e.count), (5, 8));
    }

    #[test]
    fn test_globals_with_same_name_merge() {
        let reg = StatRegistry::new();
        let a = reg.register_global("shared");
        let b = reg.register_global("shared");
        assert_eq!(a.id(), b.id());
        a.sum(2);
        b.sum(3);

        let snap = reg.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        let e = snap.by_name("shared").unwrap();
        assert_eq!((e.sum, e.count), (5, 2));
    }

    #[test]
    fn test_snapshot_without_participants() {
        let reg = StatRegistry::new();
        reg.intern("idle");
        let snap = reg.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.by_name("idle").map(|e| e.count), Some(0));
    }

    #[test]
    fn test_registered_caller_rejected() {
        let reg = Arc::new(StatRegistry::new());
        let me = reg.register_thread().unwrap();
        assert!(matches!(reg.snapshot(), Err(CoordError::RegisteredCaller)));
        assert!(matches!(
            reg.register_thread(),
            Err(CoordError::AlreadyRegistered)
        ));
        drop(me);
        assert!(reg.snapshot().is_ok());
    }
}
