//! Read API over the quote cache.
//!
//! - `GET /quotes?count=<n>`: up to `n` cached entries as a JSON array
//! - `GET /health`: liveness probe

pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};

use crate::error::Result;
use crate::storage::QuoteCache;

pub use handlers::{ReadState, handle_get_quotes, handle_health};

/// Build the read API router.
pub fn router(state: Arc<ReadState>) -> Router {
    Router::new()
        .route("/quotes", get(handle_get_quotes))
        .route("/health", get(handle_health))
        .layer(Extension(state))
}

/// Serve the read API on `address` until the process stops.
pub async fn serve(address: &str, cache: QuoteCache, default_count: usize) -> Result<()> {
    let state = Arc::new(ReadState {
        cache,
        default_count,
    });

    let listener = tokio::net::TcpListener::bind(address).await?;
    log::info!("Read API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
