//! Thread pool configuration
//!
//! Library defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Per-pool environment variables (`PLIB_POOL_<NAME>_MAX_THREADS`)
//! 2. Shared environment variables (`PLIB_POOL_MAX_THREADS`)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use plib_runtime::config::PoolConfig;
//!
//! // Named pool, env overrides applied
//! let config = PoolConfig::from_env_named("io");
//!
//! // Or customize programmatically
//! let config = PoolConfig::new()
//!     .name("disk")
//!     .max_threads(4)
//!     .stack_size(256 * 1024);
//! ```

pub mod defaults;

use plib_core::constants::POOL_ENV_PREFIX;
use plib_core::env::env_get_instance;
use plib_core::error::{CoordError, CoordResult};

/// Pool configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool name; used for worker thread names and per-pool env keys
    pub name: String,
    /// Ceiling on live worker threads
    pub max_threads: usize,
    /// Worker stack size in bytes (0 = platform default)
    pub stack_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolConfig {
    /// Defaults with the shared `PLIB_POOL_*` overrides applied.
    ///
    /// Environment variables (all optional):
    /// - `PLIB_POOL_MAX_THREADS` - Thread ceiling
    /// - `PLIB_POOL_STACK_SIZE` - Worker stack size in bytes
    pub fn from_env() -> Self {
        Self::from_env_named(defaults::POOL_NAME)
    }

    /// Defaults with overrides for the pool called `name`.
    ///
    /// `PLIB_POOL_<NAME>_MAX_THREADS` and `PLIB_POOL_<NAME>_STACK_SIZE`
    /// take precedence over the shared keys.
    pub fn from_env_named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_threads: env_get_instance(
                POOL_ENV_PREFIX,
                name,
                "MAX_THREADS",
                defaults::MAX_THREADS,
            ),
            stack_size: env_get_instance(
                POOL_ENV_PREFIX,
                name,
                "STACK_SIZE",
                defaults::STACK_SIZE,
            ),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            name: defaults::POOL_NAME.to_string(),
            max_threads: defaults::MAX_THREADS,
            stack_size: defaults::STACK_SIZE,
        }
    }

    // Builder methods

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> CoordResult<()> {
        if self.name.is_empty() {
            return Err(CoordError::InvalidConfig("name must not be empty"));
        }
        if self.max_threads == 0 {
            return Err(CoordError::InvalidConfig("max_threads must be > 0"));
        }
        if self.stack_size != 0 && self.stack_size < defaults::MIN_STACK_SIZE {
            return Err(CoordError::InvalidConfig("stack_size must be 0 or >= 64KB"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("Pool Configuration:");
        eprintln!("  name:         {}", self.name);
        eprintln!("  max_threads:  {}", self.max_threads);
        eprintln!("  stack_size:   {}", self.stack_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env() {
        let config = PoolConfig::from_env();
        assert_eq!(config.name, "pool");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .name("io")
            .max_threads(8)
            .stack_size(128 * 1024);

        assert_eq!(config.name, "io");
        assert_eq!(config.max_threads, 8);
        assert_eq!(config.stack_size, 128 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(PoolConfig::new().max_threads(0).validate().is_err());
        assert!(PoolConfig::new().name("").validate().is_err());
        assert!(PoolConfig::new().stack_size(4096).validate().is_err());
        assert!(PoolConfig::new().stack_size(0).validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_named_overrides() {
        std::env::set_var("PLIB_POOL_MAX_THREADS", "16");
        std::env::set_var("PLIB_POOL_NET_MAX_THREADS", "2");
        std::env::set_var("PLIB_POOL_NET_STACK_SIZE", "262144");

        let net = PoolConfig::from_env_named("net");
        assert_eq!(net.max_threads, 2);
        assert_eq!(net.stack_size, 262144);

        let other = PoolConfig::from_env_named("disk");
        assert_eq!(other.max_threads, 16);
        assert_eq!(other.stack_size, defaults::STACK_SIZE);

        std::env::remove_var("PLIB_POOL_MAX_THREADS");
        std::env::remove_var("PLIB_POOL_NET_MAX_THREADS");
        std::env::remove_var("PLIB_POOL_NET_STACK_SIZE");
    }
}
