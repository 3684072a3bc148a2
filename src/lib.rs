// src/lib.rs

//! Quote harvester library.
//!
//! Harvests quotes from a paginated site into a key-value cache and serves
//! them back through a small read API.

pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
