//! Quote cache: entry-key assignment and quote reconstruction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{CacheConfig, KeyStrategy, Quote};
use crate::storage::KeyValueStore;

/// Writes harvested quotes to a store and reads them back.
#[derive(Clone)]
pub struct QuoteCache {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
    key_strategy: KeyStrategy,
}

impl QuoteCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            key_strategy: config.key_strategy,
        }
    }

    /// Cache with the default `entry` prefix and sequential keys.
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, &CacheConfig::default())
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn scan_prefix(&self) -> String {
        format!("{}:", self.key_prefix)
    }

    /// Key for the quote at 0-based `index` within one write call.
    fn entry_key(&self, index: usize, quote: &Quote) -> String {
        match self.key_strategy {
            KeyStrategy::Sequence => format!("{}:{}", self.key_prefix, index + 1),
            KeyStrategy::Content => format!("{}:{}", self.key_prefix, quote.content_digest()),
        }
    }

    /// Write every quote under a fresh entry key.
    ///
    /// Stops at the first rejected write. Entries already written by this
    /// call stay in place.
    pub async fn write(&self, quotes: &[Quote]) -> Result<usize> {
        let entries: Vec<(String, Vec<(&str, &str)>)> = quotes
            .iter()
            .enumerate()
            .map(|(index, quote)| (self.entry_key(index, quote), quote.fields().to_vec()))
            .collect();

        let (written, outcome) = self.store.set_many(&entries).await;
        if let Err(e) = outcome {
            let key = entries.get(written).map_or("", |(key, _)| key.as_str());
            log::error!("Failed to store quote {key} after {written} writes: {e}");
            return Err(AppError::cache_write(key, e));
        }

        log::info!(
            "Stored {} quotes in {}",
            quotes.len(),
            self.store.describe()
        );
        Ok(quotes.len())
    }

    /// Rebuild up to `max_count` quotes from the first `max_count` keys found.
    ///
    /// Keys that fail to read or carry no text are skipped, so fewer quotes
    /// may come back. A missing author reads as [`Quote::UNKNOWN_AUTHOR`].
    pub async fn read(&self, max_count: usize) -> Result<Vec<Quote>> {
        let mut keys = self.keys().await?;
        keys.truncate(max_count);

        let results = self.store.get_many(&keys).await;
        let mut quotes = Vec::with_capacity(keys.len());
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(fields) => match Quote::from_fields(&fields) {
                    Some(quote) => quotes.push(quote),
                    None => log::warn!("Entry {key} has no text field, skipping"),
                },
                Err(e) => log::warn!("Failed to read entry {key}: {e}"),
            }
        }

        Ok(quotes)
    }

    /// Up to `max_count` entries as stored, field maps untouched.
    ///
    /// Keeps scanning past unreadable or vanished keys until `max_count`
    /// maps are collected or the keys run out. Keys are read in batches
    /// sized to the number of maps still missing.
    pub async fn read_raw(&self, max_count: usize) -> Result<Vec<HashMap<String, String>>> {
        let mut entries = Vec::new();
        if max_count == 0 {
            return Ok(entries);
        }

        let keys = self.keys().await?;
        let mut remaining = keys.as_slice();

        while entries.len() < max_count && !remaining.is_empty() {
            let take = (max_count - entries.len()).min(remaining.len());
            let (batch, rest) = remaining.split_at(take);
            remaining = rest;

            for (key, result) in batch.iter().zip(self.store.get_many(batch).await) {
                match result {
                    Ok(fields) if fields.is_empty() => log::debug!("Entry {key} vanished, skipping"),
                    Ok(fields) => entries.push(fields),
                    Err(e) => log::warn!("Failed to read entry {key}: {e}"),
                }
            }
        }

        Ok(entries)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.store
            .scan_prefix(&self.scan_prefix())
            .await
            .map_err(AppError::cache_read)
    }
}
