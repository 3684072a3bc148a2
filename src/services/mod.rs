//! Service layer for the harvester.
//!
//! - `RateLimiter`: fixed-interval gate shared by every outbound request
//! - `Fetcher`: single-page GET with bounded retries
//! - `QuoteExtractor`: quote parsing and text normalization
//! - `Harvester`: the paginated harvest loop

mod extractor;
mod fetcher;
mod harvester;
mod rate_limit;

pub use extractor::{QuoteExtractor, clean_quote_text};
pub use fetcher::{FetchedPage, Fetcher, RetryPolicy};
pub use harvester::Harvester;
pub use rate_limit::RateLimiter;
