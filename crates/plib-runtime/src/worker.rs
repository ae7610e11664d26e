//! Worker thread management
//!
//! Workers are detached OS threads. Each runs [`run_worker`] until the pool
//! lock tells it to exit; the pool tracks how many are alive through its own
//! counters rather than join handles.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use plib_core::state::WorkerState;
use tracing::{debug, error, trace};

use crate::pool::PoolShared;
use crate::tls::{self, WorkerIdentity};

/// Smallest stack the platform will give a thread
pub fn min_stack_size() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(any(target_os = "linux", target_os = "android"))] {
            libc::PTHREAD_STACK_MIN
        } else {
            16 * 1024
        }
    }
}

/// Spawn a named OS thread with an optional stack size
///
/// `stack_size == 0` keeps the platform default. Non-zero sizes below the
/// platform minimum are raised to it.
pub fn spawn_thread<F, T>(name: String, stack_size: usize, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let mut builder = thread::Builder::new().name(name);
    if stack_size != 0 {
        builder = builder.stack_size(stack_size.max(min_stack_size()));
    }
    builder.spawn(f)
}

/// Worker main loop
///
/// `live_threads` was already incremented by the submitter that started
/// this worker; `PoolShared::next_job` decrements it when it returns `None`.
pub(crate) fn run_worker(shared: Arc<PoolShared>, index: usize) {
    tls::set_current_worker(WorkerIdentity {
        pool_id: shared.id(),
        index,
    });
    let mut phase = WorkerState::Starting;
    debug!(pool = shared.name(), worker = index, state = %phase, "worker started");

    while let Some(dispatch) = shared.next_job(index, &mut phase) {
        let kind = dispatch.kind();
        trace!(pool = shared.name(), worker = index, state = %phase, kind, "dispatch");

        match panic::catch_unwind(AssertUnwindSafe(|| dispatch.run())) {
            Ok(()) => shared.record_completed(),
            Err(payload) => {
                shared.record_panicked();
                error!(
                    pool = shared.name(),
                    worker = index,
                    kind,
                    panic = panic_message(&*payload),
                    "job panicked; worker continues"
                );
            }
        }
    }

    debug_assert!(phase.is_terminated());
    debug!(pool = shared.name(), worker = index, state = %phase, "worker exiting");
    tls::clear_current_worker();
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
