//! Counting rendezvous barrier
//!
//! A mutex + condition variable counter supporting two usage patterns:
//!
//! - **Asymmetric**: `n` workers call [`Barrier::signal`], a leader calls
//!   [`Barrier::wait`] and is released once all `n` have signalled.
//! - **Symmetric**: every party calls [`Barrier::signal_and_wait`]; the last
//!   one to arrive releases everybody.
//!
//! The barrier does not rearm itself. Between phases the owner calls
//! [`Barrier::reset`] (or builds a new one). There is no timeout; a waiter
//! stays parked until the remaining parties arrive.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{CoordError, CoordResult};

/// Reusable N-party barrier
pub struct Barrier {
    /// Parties still to signal
    remaining: Mutex<usize>,

    /// Broadcast when `remaining` reaches zero
    cond: Condvar,
}

impl Barrier {
    /// Create a barrier expecting `count` signals
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one party as arrived; wakes all waiters on the last one
    pub fn signal(&self) {
        let mut remaining = self.lock();
        Self::arrive(&mut remaining, &self.cond);
    }

    /// Block until every party has signalled
    pub fn wait(&self) {
        let mut remaining = self.lock();
        while *remaining > 0 {
            remaining = self.cond.wait(remaining).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Signal and block in one critical section (symmetric rendezvous)
    pub fn signal_and_wait(&self) {
        let mut remaining = self.lock();
        Self::arrive(&mut remaining, &self.cond);
        while *remaining > 0 {
            remaining = self.cond.wait(remaining).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Parties still outstanding
    pub fn remaining(&self) -> usize {
        *self.lock()
    }

    /// Rearm for the next phase
    ///
    /// Fails with [`CoordError::Busy`] if the current phase has not
    /// completed, since waiters from it would otherwise never be released.
    pub fn reset(&self, count: usize) -> CoordResult<()> {
        let mut remaining = self.lock();
        if *remaining > 0 {
            return Err(CoordError::Busy { remaining: *remaining });
        }
        *remaining = count;
        Ok(())
    }

    /// Check that the barrier can be torn down
    ///
    /// Returns [`CoordError::Busy`] while parties are outstanding. Destroying
    /// a barrier others still rely on is a caller error; the barrier itself
    /// is freed when its last owner drops it.
    pub fn destroy(&self) -> CoordResult<()> {
        let remaining = self.lock();
        if *remaining > 0 {
            return Err(CoordError::Busy { remaining: *remaining });
        }
        Ok(())
    }

    fn arrive(remaining: &mut usize, cond: &Condvar) {
        if *remaining == 0 {
            tracing::warn!("barrier signalled with no parties outstanding");
            return;
        }
        *remaining -= 1;
        if *remaining == 0 {
            cond.notify_all();
        }
    }
}

impl std::fmt::Debug for Barrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Barrier")
            .field("remaining", &self.remaining())
            .finish()
    }
}
