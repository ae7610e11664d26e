//! Named counters with cooperative snapshots
//!
//! Two kinds of stat share one id space:
//!
//! - [`LocalStat`] lives in the arena of a [`ThreadStats`] participant and
//!   is updated with plain loads and stores, no synchronization.
//! - [`GlobalStat`] is an atomic cell any thread may update.
//!
//! A snapshot merges every stat with the same name into one entry. Local
//! arenas can only be read by their owner, so a snapshot waits until each
//! other participant has called [`ThreadStats::checkpoint`].
//!
//! ```rust,ignore
//! let registry = Arc::new(StatRegistry::new());
//! let me = registry.register_thread()?;
//! let served = me.register_local("requests");
//! served.sum(bytes);
//!
//! // in the event loop
//! me.checkpoint();
//! ```
//!
//! Each stat carries a `sum` and a `count`. `sum(v)` adds `v` to the sum
//! and 1 to the count; `add(v)` adds `v` to the count only.

mod local;
mod registry;
mod snapshot;

pub use local::{LocalStat, ThreadStats};
pub use registry::{GlobalStat, StatRegistry};
pub use snapshot::{Snapshot, StatEntry};

use std::ops::AddAssign;

use plib_core::id::StatId;

/// Update operations shared by local and global stats
pub trait Stat {
    fn id(&self) -> StatId;

    /// Record a sample: `sum += v`, `count += 1`
    fn sum(&self, v: i64);

    /// `count += v`
    fn add(&self, v: i64);

    #[inline]
    fn inc(&self) {
        self.add(1);
    }

    #[inline]
    fn dec(&self) {
        self.add(-1);
    }
}

/// Record `delta` as a sample on either kind of stat
#[inline]
pub fn increment<S: Stat + ?Sized>(stat: &S, delta: i64) {
    stat.sum(delta);
}

/// Accumulated sum and count for one id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    pub(crate) sum: i64,
    pub(crate) count: i64,
}

impl AddAssign for Totals {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.sum += rhs.sum;
        self.count += rhs.count;
    }
}

/// Add `t` into slot `id`, growing `totals` if the id is newer than it
#[inline]
pub(crate) fn accumulate(totals: &mut Vec<Totals>, id: StatId, t: Totals) {
    let i = id.as_usize();
    if i >= totals.len() {
        totals.resize(i + 1, Totals::default());
    }
    totals[i] += t;
}
