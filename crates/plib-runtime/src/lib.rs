//! # plib-runtime
//!
//! Threaded runtime for the plib coordination layer.
//!
//! This crate provides:
//! - On-demand worker thread pool with a slab-backed job queue
//! - Pluggable work queue contract
//! - Named stats with cooperative per-thread snapshots
//! - Environment-driven pool configuration

pub mod config;
pub mod job;
pub mod pool;
pub mod queue;
pub mod stat;
pub mod tls;
pub mod worker;

// Re-exports
pub use config::PoolConfig;
pub use job::PoolJob;
pub use pool::{PoolStats, ThreadPool};
pub use queue::{FifoQueue, WorkQueue};
pub use stat::{
    increment, GlobalStat, LocalStat, Snapshot, Stat, StatEntry, StatRegistry, ThreadStats,
};
pub use tls::{current_worker, WorkerIdentity};
pub use worker::spawn_thread;
