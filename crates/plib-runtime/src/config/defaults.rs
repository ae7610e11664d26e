//! Library defaults for pool configuration

/// Pool name used when none is given
pub const POOL_NAME: &str = "pool";

/// Thread ceiling: effectively unbounded, grow on demand
pub const MAX_THREADS: usize = i32::MAX as usize;

/// Worker stack size in bytes; 0 keeps the platform default
pub const STACK_SIZE: usize = 0;

/// Smallest explicit stack size `validate()` accepts
pub const MIN_STACK_SIZE: usize = 64 * 1024;
