// src/pipeline/batch.rs

//! One full harvest-and-store cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::HarvestReport;
use crate::pipeline::Pipeline;

/// Summary of a completed batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub report: HarvestReport,
    /// Quotes written to the cache
    pub stored: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl Pipeline {
    /// Harvest the configured source and store the result.
    pub async fn run_batch(&self) -> Result<BatchSummary> {
        let source = &self.config().source;
        self.run_batch_with(&source.base_url, source.desired_count)
            .await
    }

    /// Harvest `base_url` for `desired_count` quotes and store the result.
    ///
    /// Page-level failures only show up in the report. A rejected cache
    /// write aborts the run.
    pub async fn run_batch_with(&self, base_url: &str, desired_count: usize) -> Result<BatchSummary> {
        let started_at = Utc::now();
        log::info!("Starting harvest of {desired_count} quotes from {base_url}");

        let outcome = self.harvester.harvest(base_url, desired_count).await?;
        log::info!(
            "Harvested {} quotes over {} pages ({} skipped)",
            outcome.quotes.len(),
            outcome.report.pages_attempted,
            outcome.report.pages_skipped
        );

        let stored = self.cache().write(&outcome.quotes).await?;

        Ok(BatchSummary {
            report: outcome.report,
            stored,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
