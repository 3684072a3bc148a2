// src/models/mod.rs

//! Domain models for the harvester.

mod config;
mod quote;
mod report;

// Re-export all public types
pub use config::{
    CacheConfig, Config, ExtractConfig, FetchConfig, KeyStrategy, LoggingConfig, ServerConfig,
    SourceConfig,
};
pub use quote::Quote;
pub use report::{HarvestOutcome, HarvestReport, Termination};
