//! Harvest bookkeeping returned alongside the quotes.

use serde::Serialize;

use super::Quote;

/// Why a harvest loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// Collected at least the desired number of quotes
    TargetReached,
    /// The source answered a page with a non-success status
    SourceExhausted { status: u16 },
    /// Hit the configured page-attempt bound
    PageLimit,
}

/// Per-run counters for a harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// Pages requested, including skipped ones
    pub pages_attempted: u32,
    /// Pages dropped after a fetch or parse failure
    pub pages_skipped: u32,
    pub fetch_failures: u32,
    pub parse_failures: u32,
    pub quotes_extracted: usize,
    pub termination: Termination,
}

impl Default for HarvestReport {
    fn default() -> Self {
        Self {
            pages_attempted: 0,
            pages_skipped: 0,
            fetch_failures: 0,
            parse_failures: 0,
            quotes_extracted: 0,
            termination: Termination::TargetReached,
        }
    }
}

/// Result of one harvest run.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub quotes: Vec<Quote>,
    pub report: HarvestReport,
}
