//! AWS Lambda entry point for the quote harvester
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! and attach a scheduled trigger to the generated binary.

use harvester::lambda::handler;
use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Quote harvester Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
