//! Paginated harvest loop.
//!
//! Walks `{base}/page/1/`, `{base}/page/2/`, ... until enough quotes are
//! collected, the source answers with a non-success status, or the page
//! bound is hit. A page that cannot be fetched or parsed is skipped and
//! counted in the report; it never aborts the run.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, HarvestOutcome, Termination};
use crate::services::{Fetcher, QuoteExtractor, RateLimiter};
use crate::utils::url::page_url;

/// Drives fetch and extraction page by page.
pub struct Harvester {
    fetcher: Fetcher,
    extractor: QuoteExtractor,
    max_pages: u32,
}

impl Harvester {
    /// Build a harvester with its own rate limiter.
    pub fn new(config: &Config) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.fetch.rate_limit_ms,
        )));
        Self::with_limiter(config, limiter)
    }

    /// Build a harvester that shares `limiter` with other callers.
    pub fn with_limiter(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self> {
        Ok(Self::from_parts(
            Fetcher::new(&config.fetch, limiter)?,
            QuoteExtractor::new(&config.extract)?,
            config.source.max_pages,
        ))
    }

    pub fn from_parts(fetcher: Fetcher, extractor: QuoteExtractor, max_pages: u32) -> Self {
        Self {
            fetcher,
            extractor,
            max_pages,
        }
    }

    /// Harvest until `desired_count` quotes are collected or the source runs out.
    ///
    /// The count is checked before each page, so the last page's quotes are
    /// all kept and the result can exceed `desired_count`. It is shorter when
    /// the source is exhausted first.
    pub async fn harvest(&self, base_url: &str, desired_count: usize) -> Result<HarvestOutcome> {
        url::Url::parse(base_url)?;

        let mut outcome = HarvestOutcome::default();
        let report = &mut outcome.report;
        let mut page = 1u32;

        while outcome.quotes.len() < desired_count {
            if report.pages_attempted >= self.max_pages {
                log::warn!(
                    "Stopping after {} page attempts with {} of {} quotes",
                    report.pages_attempted,
                    outcome.quotes.len(),
                    desired_count
                );
                report.termination = Termination::PageLimit;
                break;
            }

            let url = page_url(base_url, page);
            report.pages_attempted += 1;
            log::info!("Harvesting {url}");

            let response = match self.fetcher.fetch(&url).await {
                Ok(response) => response,
                Err(e) if e.is_page_level() => {
                    log::warn!("Skipping page {page}: {e}");
                    if matches!(e, AppError::ParseFailed { .. }) {
                        report.parse_failures += 1;
                    } else {
                        report.fetch_failures += 1;
                    }
                    report.pages_skipped += 1;
                    page += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !response.is_success() {
                log::info!(
                    "Page {page} answered {}; treating it as the last page",
                    response.status
                );
                report.termination = Termination::SourceExhausted {
                    status: response.status.as_u16(),
                };
                break;
            }

            let quotes = self.extractor.extract(&response.body);
            report.quotes_extracted += quotes.len();
            outcome.quotes.extend(quotes);
            log::info!(
                "Page {page} done, {} quotes collected so far",
                outcome.quotes.len()
            );

            page += 1;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::ExtractConfig;
    use crate::services::RetryPolicy;

    fn page_html(page: u32, per_page: usize) -> String {
        let quotes: String = (0..per_page)
            .map(|i| {
                format!(
                    r#"<div class="quote"><span class="text">“Quote {page}-{i}”</span>
                    <small class="author">Author {page}</small></div>"#
                )
            })
            .collect();
        format!("<html><body>{quotes}</body></html>")
    }

    fn harvester(max_pages: u32) -> Harvester {
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let fetcher = Fetcher::with_client(
            client,
            Arc::new(RateLimiter::unlimited()),
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(5),
            },
        );
        let extractor = QuoteExtractor::new(&ExtractConfig::default()).unwrap();
        Harvester::from_parts(fetcher, extractor, max_pages)
    }

    async fn mount_page(server: &MockServer, page: u32, template: ResponseTemplate, hits: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/page/{page}/")))
            .respond_with(template)
            .expect(hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_count_checked_before_each_page() {
        let server = MockServer::start().await;
        for page in 1..=3 {
            let body = ResponseTemplate::new(200).set_body_string(page_html(page, 2));
            mount_page(&server, page, body, 1).await;
        }
        mount_page(&server, 4, ResponseTemplate::new(404), 0).await;

        let outcome = harvester(100).harvest(&server.uri(), 5).await.unwrap();

        assert_eq!(outcome.quotes.len(), 6);
        assert_eq!(outcome.quotes[0], crate::models::Quote::new("Quote 1-0", "Author 1"));
        assert_eq!(outcome.report.pages_attempted, 3);
        assert_eq!(outcome.report.termination, Termination::TargetReached);
    }

    #[tokio::test]
    async fn test_error_status_ends_pagination() {
        let server = MockServer::start().await;
        for page in 1..=2 {
            let body = ResponseTemplate::new(200).set_body_string(page_html(page, 2));
            mount_page(&server, page, body, 1).await;
        }
        mount_page(&server, 3, ResponseTemplate::new(404), 1).await;

        let outcome = harvester(100).harvest(&server.uri(), 10).await.unwrap();

        assert_eq!(outcome.quotes.len(), 4);
        assert!(outcome.quotes.iter().all(|q| q.author != "Author 3"));
        assert_eq!(outcome.report.pages_attempted, 3);
        assert_eq!(
            outcome.report.termination,
            Termination::SourceExhausted { status: 404 }
        );
    }

    #[tokio::test]
    async fn test_empty_success_pages_do_not_terminate() {
        let server = MockServer::start().await;
        let empty = ResponseTemplate::new(200).set_body_string("<html><body></body></html>");
        mount_page(&server, 1, empty.clone(), 1).await;
        mount_page(&server, 2, empty, 1).await;
        let body = ResponseTemplate::new(200).set_body_string(page_html(3, 3));
        mount_page(&server, 3, body, 1).await;

        let outcome = harvester(100).harvest(&server.uri(), 3).await.unwrap();

        assert_eq!(outcome.quotes.len(), 3);
        assert_eq!(outcome.report.pages_attempted, 3);
        assert_eq!(outcome.report.pages_skipped, 0);
    }

    #[tokio::test]
    async fn test_page_limit_bounds_endless_empty_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(4)
            .mount(&server)
            .await;

        let outcome = harvester(4).harvest(&server.uri(), 10).await.unwrap();

        assert!(outcome.quotes.is_empty());
        assert_eq!(outcome.report.pages_attempted, 4);
        assert_eq!(outcome.report.termination, Termination::PageLimit);
    }

    #[tokio::test]
    async fn test_unreachable_page_is_skipped() {
        let server = MockServer::start().await;
        let body = ResponseTemplate::new(200).set_body_string(page_html(1, 2));
        mount_page(&server, 1, body, 1).await;
        let slow = ResponseTemplate::new(200)
            .set_body_string(page_html(2, 2))
            .set_delay(Duration::from_secs(2));
        mount_page(&server, 2, slow, 3).await;
        let body = ResponseTemplate::new(200).set_body_string(page_html(3, 2));
        mount_page(&server, 3, body, 1).await;

        let outcome = harvester(100).harvest(&server.uri(), 10).await.unwrap();

        assert_eq!(outcome.quotes.len(), 4);
        assert!(outcome.quotes.iter().all(|q| q.author != "Author 2"));
        assert_eq!(outcome.report.fetch_failures, 1);
        assert_eq!(outcome.report.pages_skipped, 1);
        assert_eq!(outcome.report.pages_attempted, 4);
        assert_eq!(
            outcome.report.termination,
            Termination::SourceExhausted { status: 404 }
        );
    }

    #[tokio::test]
    async fn test_latin1_page_is_harvested() {
        let server = MockServer::start().await;
        let body = b"<div class=\"quote\"><span class=\"text\">Caf\xe9 au lait</span>\
            <small class=\"author\">Ren\xe9</small></div>"
            .to_vec();
        let latin1 = ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-1");
        mount_page(&server, 1, latin1, 1).await;

        let outcome = harvester(100).harvest(&server.uri(), 1).await.unwrap();

        assert_eq!(outcome.quotes, vec![crate::models::Quote::new("Café au lait", "René")]);
        assert_eq!(outcome.report.parse_failures, 0);
        assert_eq!(outcome.report.pages_skipped, 0);
    }

    #[tokio::test]
    async fn test_stray_byte_keeps_page() {
        let server = MockServer::start().await;
        let mut body = page_html(1, 2).into_bytes();
        body.extend_from_slice(b"<p>\xff\xfe</p>");
        let page = ResponseTemplate::new(200).set_body_raw(body, "text/html");
        mount_page(&server, 1, page, 1).await;

        let outcome = harvester(100).harvest(&server.uri(), 2).await.unwrap();

        assert_eq!(outcome.quotes.len(), 2);
        assert_eq!(outcome.report.quotes_extracted, 2);
        assert_eq!(outcome.report.parse_failures, 0);
    }

    #[tokio::test]
    async fn test_zero_desired_fetches_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = harvester(100).harvest(&server.uri(), 0).await.unwrap();
        assert!(outcome.quotes.is_empty());
        assert_eq!(outcome.report.pages_attempted, 0);
    }

    #[tokio::test]
    async fn test_invalid_base_url() {
        let err = harvester(10).harvest("not a url", 5).await.unwrap_err();
        assert!(matches!(err, AppError::Url(_)));
    }
}
