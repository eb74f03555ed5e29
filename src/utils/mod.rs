//! Utility modules supporting the pipeline.
//!
//! - [`deduplicate_papers`]: Drop papers whose identifier was already seen, keeping the first
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff
//! - [`with_retry`]: Execute a fetch with automatic retry on transient errors
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use daily_papers::fetch::FetchError;
//! use daily_papers::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, FetchError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), FetchError> {
//! let config = RetryConfig { max_attempts: 3, ..RetryConfig::default() };
//! let body = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod dedup;
mod retry;

pub use dedup::deduplicate_papers;
pub use retry::{with_retry, RetryConfig};
