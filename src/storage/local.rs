//! Local filesystem storage implementation.
//!
//! Keeps every entry in a single JSON document, rewritten atomically on each
//! change. Meant for local mode and tests; production deployments use
//! [`RedisStore`](super::RedisStore).
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── cache.json    # { "entry:1": { "text": ..., "author": ... }, ... }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

const CACHE_FILE: &str = "cache.json";

type Entries = BTreeMap<String, BTreeMap<String, String>>;

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_entries(&self) -> Result<Entries> {
        Ok(self.read_json(CACHE_FILE).await?.unwrap_or_default())
    }
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_entries().await?;
        let entry = entries.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert(field.to_string(), value.to_string());
        }
        self.write_json(CACHE_FILE, &entries).await
    }

    async fn set_many(&self, entries: &[(String, Vec<(&str, &str)>)]) -> (usize, Result<()>) {
        if entries.is_empty() {
            return (0, Ok(()));
        }

        let _guard = self.lock.lock().await;
        let mut stored = match self.load_entries().await {
            Ok(stored) => stored,
            Err(e) => return (0, Err(e)),
        };
        for (key, fields) in entries {
            let entry = stored.entry(key.clone()).or_default();
            for (field, value) in fields {
                entry.insert(field.to_string(), value.to_string());
            }
        }

        // One rewrite for the whole batch: all of it lands or none of it.
        match self.write_json(CACHE_FILE, &stored).await {
            Ok(()) => (entries.len(), Ok(())),
            Err(e) => (0, Err(e)),
        }
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Result<HashMap<String, String>>> {
        let _guard = self.lock.lock().await;
        match self.load_entries().await {
            Ok(mut stored) => keys
                .iter()
                .map(|key| {
                    Ok(stored
                        .remove(key)
                        .map(|fields| fields.into_iter().collect())
                        .unwrap_or_default())
                })
                .collect(),
            Err(e) => {
                let message = e.to_string();
                keys.iter().map(|_| Err(AppError::cache_read(&message))).collect()
            }
        }
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let entries = self.load_entries().await?;
        Ok(entries
            .into_keys()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_entries().await?;
        Ok(entries
            .remove(key)
            .map(|fields| fields.into_iter().collect())
            .unwrap_or_default())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.path(CACHE_FILE).display())
    }
}
