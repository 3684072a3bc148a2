//! Storage abstractions for cached quotes.
//!
//! A [`KeyValueStore`] holds field maps under string keys, in the shape of a
//! Redis hash. [`QuoteCache`] layers entry-key assignment and quote
//! reconstruction on top of any store.
//!
//! ```text
//! entry:1  -> { text: "...", author: "..." }
//! entry:2  -> { text: "...", author: "..." }
//! ```

pub mod cache;
pub mod local;
pub mod redis;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CacheConfig;

// Re-export for convenience
pub use cache::QuoteCache;
pub use local::LocalStorage;
pub use self::redis::RedisStore;

/// Trait for field-map key-value backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Set `fields` on the map stored at `key`, creating it if needed.
    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;

    /// List every key starting with `prefix`, in the backend's native order.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read the whole field map at `key`. A missing key yields an empty map.
    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Set several field maps in order, stopping at the first failure.
    ///
    /// Returns how many entries were written before the outcome. Entries
    /// written before a failure stay in place.
    async fn set_many(&self, entries: &[(String, Vec<(&str, &str)>)]) -> (usize, Result<()>) {
        for (written, (key, fields)) in entries.iter().enumerate() {
            if let Err(e) = self.set_fields(key, fields).await {
                return (written, Err(e));
            }
        }
        (entries.len(), Ok(()))
    }

    /// Read the field maps at `keys`, one result per key in the same order.
    async fn get_many(&self, keys: &[String]) -> Vec<Result<HashMap<String, String>>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get_fields(key).await);
        }
        results
    }

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Open the backend selected by `config`.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn KeyValueStore>> {
    if config.use_local() {
        let storage = LocalStorage::new(&config.local_dir);
        log::info!("Using local cache store at {}", config.local_dir);
        Ok(Arc::new(storage))
    } else {
        log::info!(
            "Using {} cache store in {}",
            config.provider,
            config.region
        );
        let store = RedisStore::connect(&config.redis_url()).await?;
        Ok(Arc::new(store))
    }
}
