//! Single-page HTTP fetch with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::services::RateLimiter;
use crate::utils::http;

/// Retry budget for transport failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// A received HTTP response, successful or not.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: StatusCode,
    /// Body decoded with the response charset, malformed sequences replaced
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Performs rate-limited GET requests, retrying transport failures only.
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher with a client built from `config`.
    pub fn new(config: &FetchConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = http::create_client(config)?;
        Ok(Self::with_client(
            client,
            limiter,
            RetryPolicy::from_config(config),
        ))
    }

    pub fn with_client(client: Client, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            policy,
        }
    }

    /// GET `url`.
    ///
    /// Any HTTP status counts as a response and is returned as-is. Connection,
    /// DNS, timeout and body-read failures are retried up to the policy's
    /// attempt budget, each attempt passing through the rate limiter. A body
    /// that cannot be decoded fails at once with [`AppError::ParseFailed`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < max_attempts {
            attempts += 1;
            self.limiter.acquire().await;

            match self.try_fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_decode() => return Err(AppError::parse(url, e)),
                Err(e) => {
                    log::warn!("Attempt {attempts}/{max_attempts} failed for {url}: {e}");
                    last_error = e.to_string();
                }
            }

            if attempts < max_attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(AppError::FetchExhausted {
            url: url.to_string(),
            attempts,
            cause: last_error,
        })
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<FetchedPage, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }
}
