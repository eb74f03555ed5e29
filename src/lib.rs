//! # Daily Papers
//!
//! Discovers the day's research papers on a listing site, downloads their
//! arXiv PDFs and hands them to a processing service.
//!
//! ## Architecture
//!
//! - [`fetch`]: The fetch port and its reqwest implementation
//! - [`extract`]: Multi-strategy extraction (embedded JSON, markup, API endpoints)
//! - [`models`]: Paper records and run outcomes
//! - [`download`]: PDF download driver and run-state persistence
//! - [`processor`]: Processing-service client and directory watcher
//! - [`scheduler`]: Daily run scheduling
//! - [`utils`]: Retry with backoff and deduplication
//! - [`config`]: Configuration management

pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod processor;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use extract::PaperExtractor;
pub use fetch::{Fetcher, HttpFetcher};
pub use models::PaperRecord;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
