// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failures persisted through every retry attempt
    #[error("Failed to fetch {url} after {attempts} attempts: {cause}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        cause: String,
    },

    /// Page markup could not be parsed
    #[error("Failed to parse page {url}: {message}")]
    ParseFailed { url: String, message: String },

    /// The cache rejected a write
    #[error("Cache write failed for {key}: {message}")]
    CacheWriteFailed { key: String, message: String },

    /// The cache could not enumerate its entries
    #[error("Cache read failed: {0}")]
    CacheReadFailed(String),

    /// Redis command or connection failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a page parse error.
    pub fn parse(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ParseFailed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a cache write error for a specific entry key.
    pub fn cache_write(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::CacheWriteFailed {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a cache enumeration error.
    pub fn cache_read(message: impl fmt::Display) -> Self {
        Self::CacheReadFailed(message.to_string())
    }

    /// Errors scoped to a single page; the harvest loop skips the page and carries on.
    pub fn is_page_level(&self) -> bool {
        matches!(self, Self::FetchExhausted { .. } | Self::ParseFailed { .. })
    }
}
