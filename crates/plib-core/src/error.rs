//! Error types for plib coordination primitives

use std::io;
use thiserror::Error;

/// Result type for coordination operations
pub type CoordResult<T> = Result<T, CoordError>;

/// Errors that can occur in pool, barrier and stat operations
#[derive(Debug, Error)]
pub enum CoordError {
    /// OS refused to create a worker thread
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),

    /// Barrier still has parties outstanding
    #[error("barrier busy: {remaining} parties outstanding")]
    Busy { remaining: usize },

    /// `shutdown()` called from one of the pool's own workers
    #[error("shutdown called from a worker of the same pool")]
    ShutdownFromWorker,

    /// Registry-level snapshot requested from a thread that owns a
    /// stat participant; it must snapshot through its participant
    #[error("snapshot requested by a registered stat thread; use its ThreadStats")]
    RegisteredCaller,

    /// Thread already owns a live stat participant for this registry
    #[error("thread is already registered with this stat registry")]
    AlreadyRegistered,

    /// Configuration rejected by `validate()`
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

impl CoordError {
    /// Check if this is the barrier busy indication
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self, CoordError::Busy { .. })
    }
}

impl From<io::Error> for CoordError {
    fn from(e: io::Error) -> Self {
        CoordError::Spawn(e)
    }
}
