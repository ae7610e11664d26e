//! # plib - thread coordination for multithreaded services
//!
//! Thread pool, barrier and cross-thread statistics for programs built on
//! plain OS threads.
//!
//! ## Features
//!
//! - **ThreadPool**: grows workers on demand up to a ceiling, shrinks when
//!   the ceiling is lowered, draining shutdown
//! - **SlabAllocator**: O(1) recycling of job descriptors
//! - **Barrier**: reusable N-party rendezvous, asymmetric or symmetric
//! - **StatRegistry**: lock-free per-thread counters merged by cooperative
//!   snapshots
//!
//! ## Quick Start
//!
//! ```ignore
//! use plib::{Barrier, Services};
//! use std::sync::Arc;
//!
//! fn main() -> plib::CoordResult<()> {
//!     plib::logging::init();
//!
//!     let mut services = Services::new();
//!     let pool = services.add_pool("work")?;
//!
//!     let done = Arc::new(Barrier::new(5));
//!     for i in 0..5 {
//!         let done = Arc::clone(&done);
//!         pool.submit(move || {
//!             println!("job {}", i);
//!             done.signal();
//!         })?;
//!     }
//!     done.wait();
//!
//!     services.shutdown()
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │       submit(), Barrier, register_local(), snapshot()       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┴───────────────────┐
//!          ▼                                       ▼
//! ┌─────────────────────────┐        ┌─────────────────────────┐
//! │       ThreadPool        │        │      StatRegistry       │
//! │  queue + slab + counts  │        │ names, globals, serial  │
//! └─────────────────────────┘        └─────────────────────────┘
//!          │                                       ▲
//!          ▼                                       │ checkpoint()
//!    ┌───────────┐ ┌───────────┐         ┌─────────────────────┐
//!    │  Worker   │ │  Worker   │  ...    │ ThreadStats (local) │
//!    └───────────┘ └───────────┘         └─────────────────────┘
//! ```

pub mod logging;
pub mod services;

pub use services::Services;
pub use logging::{LogLevel, init as init_logging, set_log_level};

// Re-export core types
pub use plib_core::{
    Barrier,
    CoordError,
    CoordResult,
    SlabAllocator,
    SlabHandle,
    StatId,
    WorkerState,
};

// Re-export env utilities
pub use plib_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use plib_runtime::{
    current_worker,
    increment,
    spawn_thread,
    FifoQueue,
    GlobalStat,
    LocalStat,
    PoolConfig,
    PoolJob,
    PoolStats,
    Snapshot,
    Stat,
    StatEntry,
    StatRegistry,
    ThreadPool,
    ThreadStats,
    WorkQueue,
    WorkerIdentity,
};
