//! Pipeline entry points.
//!
//! A [`Pipeline`] bundles everything one harvest-and-store cycle needs: the
//! configuration, a [`Harvester`] with its own rate limiter, and a
//! [`QuoteCache`] over an explicitly opened store. Instances share nothing,
//! so several can run side by side.

mod batch;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::services::Harvester;
use crate::storage::{self, KeyValueStore, QuoteCache};

pub use batch::BatchSummary;

/// Harvest-and-store context.
pub struct Pipeline {
    config: Arc<Config>,
    harvester: Harvester,
    cache: QuoteCache,
}

impl Pipeline {
    /// Build a pipeline over an already opened store.
    pub fn new(config: Arc<Config>, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let harvester = Harvester::new(&config)?;
        let cache = QuoteCache::new(store, &config.cache);
        Ok(Self::from_parts(config, harvester, cache))
    }

    /// Open the configured store and build a pipeline over it.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let store = storage::connect(&config.cache).await?;
        Self::new(config, store)
    }

    pub fn from_parts(config: Arc<Config>, harvester: Harvester, cache: QuoteCache) -> Self {
        Self {
            config,
            harvester,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }
}
