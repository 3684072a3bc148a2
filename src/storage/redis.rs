//! Redis (ElastiCache) storage implementation.
//!
//! Entries are Redis hashes written with `HSET` and enumerated with `SCAN`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::Result;
use crate::storage::KeyValueStore;

const SCAN_BATCH: usize = 100;

/// Redis-backed store sharing one multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    url: String,
}

impl RedisStore {
    /// Connect to `url` and verify the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut manager = client.get_connection_manager().await?;
        let _: String = redis::cmd("PING").query_async(&mut manager).await?;
        log::info!("Connected to Redis at {url}");

        Ok(Self {
            manager,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut con = self.manager.clone();
        let _: () = con.hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut con = self.manager.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut con)
                .await?;

            // SCAN may return a key more than once.
            keys.extend(batch.into_iter().filter(|key| seen.insert(key.clone())));

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut con = self.manager.clone();
        let fields: HashMap<String, String> = con.hgetall(key).await?;
        Ok(fields)
    }

    fn describe(&self) -> String {
        format!("redis:{}", self.url)
    }
}
