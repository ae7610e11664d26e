//! # plib-core
//!
//! Core types for the plib coordination layer.
//!
//! This crate starts no threads. Everything that spawns or parks OS
//! threads lives in `plib-runtime`.
//!
//! ## Modules
//!
//! - `id` - Dense stat ids and slab handles
//! - `state` - Worker lifecycle states
//! - `slab` - Fixed-block slab allocator for job descriptors
//! - `barrier` - Counting rendezvous barrier
//! - `error` - Error types
//! - `env` - Environment variable utilities

pub mod id;
pub mod state;
pub mod slab;
pub mod barrier;
pub mod error;
pub mod env;

// Re-exports for convenience
pub use id::{SlabHandle, StatId};
pub use state::WorkerState;
pub use slab::SlabAllocator;
pub use barrier::Barrier;
pub use error::{CoordError, CoordResult};
pub use env::{env_get, env_get_bool, env_get_instance, env_get_opt, env_get_str, env_is_set};

/// Constants shared across crates
pub mod constants {
    /// Slots per slab block for job descriptors
    pub const JOB_SLAB_BLOCK: usize = 64;

    /// Environment prefix for pool settings
    pub const POOL_ENV_PREFIX: &str = "PLIB_POOL";
}
