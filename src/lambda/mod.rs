// src/lambda/mod.rs

//! AWS Lambda handler for scheduled harvests.
//!
//! Each invocation runs one harvest-and-store cycle:
//! 1. Loads configuration from the environment
//! 2. Opens the configured cache store
//! 3. Harvests the source up to the desired count
//! 4. Writes the quotes to the cache
//!
//! The event payload is ignored, so any scheduler or manual trigger works.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::{BatchSummary, Pipeline};

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct BatchResponse {
    /// Whether the harvest and store both completed
    pub success: bool,

    /// Human-readable outcome
    pub message: String,

    pub quotes_stored: usize,
    pub pages_attempted: u32,
    pub pages_skipped: u32,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl BatchResponse {
    fn completed(summary: &BatchSummary, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            message: "Quotes successfully processed".to_string(),
            quotes_stored: summary.stored,
            pages_attempted: summary.report.pages_attempted,
            pages_skipped: summary.report.pages_skipped,
            error: None,
            execution_time_ms,
        }
    }

    fn failed(error: &AppError, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            message: "Harvest failed".to_string(),
            error: Some(error.to_string()),
            execution_time_ms,
            ..Default::default()
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<BatchResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (_payload, context) = event.into_parts();
    info!("Starting scheduled harvest, request {}", context.request_id);

    match run_harvest().await {
        Ok(summary) => {
            let response = BatchResponse::completed(&summary, start.elapsed().as_millis() as u64);
            info!(
                "Harvest completed: {} quotes stored over {} pages in {}ms",
                response.quotes_stored, response.pages_attempted, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Harvest failed: {}", e);
            Ok(BatchResponse::failed(&e, start.elapsed().as_millis() as u64))
        }
    }
}

/// Internal harvest logic.
async fn run_harvest() -> Result<BatchSummary> {
    let config = load_lambda_config()?;
    info!(
        "Harvesting {} quotes from {} into {} ({})",
        config.source.desired_count, config.source.base_url, config.cache.provider, config.cache.region
    );

    let pipeline = Pipeline::from_config(Arc::new(config)).await?;
    pipeline.run_batch().await
}

/// Load configuration suitable for Lambda environment.
fn load_lambda_config() -> Result<Config> {
    let config = Config::from_env();
    config.validate()?;
    Ok(config)
}
