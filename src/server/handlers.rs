use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::storage::QuoteCache;

/// Shared state of the read API.
pub struct ReadState {
    pub cache: QuoteCache,
    /// Used when `count` is absent, unparsable or not positive
    pub default_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct QuotesParams {
    pub count: Option<String>,
}

pub async fn handle_get_quotes(
    Query(params): Query<QuotesParams>,
    Extension(state): Extension<Arc<ReadState>>,
) -> Response {
    let count = resolve_count(params.count.as_deref(), state.default_count);

    match state.cache.read_raw(count).await {
        Ok(entries) => {
            log::debug!("Serving {} of {} requested quotes", entries.len(), count);
            Json(entries).into_response()
        }
        Err(e) => {
            log::error!("Failed to list quotes: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to scan keys: {e}"),
            )
                .into_response()
        }
    }
}

pub async fn handle_health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

fn resolve_count(raw: Option<&str>, default_count: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|count| *count > 0)
        .unwrap_or(default_count)
}
