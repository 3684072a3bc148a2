//! Fixed-interval request gate.
//!
//! Every outbound request, retries included, waits for the gate. Two
//! requests are never issued closer together than the configured period,
//! however long the previous one took to complete.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Shared ticking gate for outbound fetches.
#[derive(Debug)]
pub struct RateLimiter {
    period: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a gate allowing one request per `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_slot: Mutex::new(None),
        }
    }

    /// A gate that never blocks.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the next request may be issued and claim that slot.
    pub async fn acquire(&self) {
        if self.period.is_zero() {
            return;
        }

        // Held across the sleep so waiters are released one slot at a time.
        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            if slot > Instant::now() {
                sleep_until(slot).await;
            }
        }
        *next_slot = Some(Instant::now() + self.period);
    }
}
