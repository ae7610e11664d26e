//! Process-level bundle of named pools and a stat registry

use std::sync::Arc;

use plib_core::error::{CoordError, CoordResult};
use plib_runtime::{PoolConfig, StatRegistry, ThreadPool};
use tracing::info;

/// Named thread pools plus the stat registry they report into
///
/// Pools are shut down in reverse order of creation when the bundle is
/// shut down or dropped.
pub struct Services {
    pools: Vec<ThreadPool>,
    stats: Arc<StatRegistry>,
}

impl Services {
    pub fn new() -> Self {
        Self {
            pools: Vec::new(),
            stats: Arc::new(StatRegistry::new()),
        }
    }

    /// Add a pool configured from `PLIB_POOL_<NAME>_*` / `PLIB_POOL_*`
    pub fn add_pool(&mut self, name: &str) -> CoordResult<&ThreadPool> {
        self.add_pool_with(PoolConfig::from_env_named(name))
    }

    /// Add a pool with an explicit configuration
    pub fn add_pool_with(&mut self, config: PoolConfig) -> CoordResult<&ThreadPool> {
        if self.pool(&config.name).is_some() {
            return Err(CoordError::InvalidConfig("duplicate pool name"));
        }
        let pool = ThreadPool::new(config)?;
        info!(
            pool = pool.name(),
            max_threads = pool.max_threads(),
            stack_size = pool.stack_size(),
            "pool added"
        );
        self.pools.push(pool);
        Ok(&self.pools[self.pools.len() - 1])
    }

    pub fn pool(&self, name: &str) -> Option<&ThreadPool> {
        self.pools.iter().find(|p| p.name() == name)
    }

    pub fn pools(&self) -> impl Iterator<Item = &ThreadPool> {
        self.pools.iter()
    }

    pub fn stats(&self) -> &Arc<StatRegistry> {
        &self.stats
    }

    /// Shut every pool down, newest first
    pub fn shutdown(&self) -> CoordResult<()> {
        for pool in self.pools.iter().rev() {
            pool.shutdown()?;
        }
        Ok(())
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Services {
    fn drop(&mut self) {
        // Vec would drop oldest first
        while let Some(pool) = self.pools.pop() {
            drop(pool);
        }
    }
}
