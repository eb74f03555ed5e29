//! The fetch port: how the extraction pipeline and the downloader reach the network.
//!
//! The pipeline only sees [`Fetcher`]. Timeouts, retries and request headers
//! belong to the implementation ([`HttpFetcher`]), configured explicitly at
//! construction time.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use std::path::Path;

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only a 200 counts as data for the pipeline
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors surfaced by a [`Fetcher`] once its own retry budget is spent
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection or protocol failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a status that is worth retrying (429, 5xx)
    #[error("HTTP status {0}")]
    Status(u16),

    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Writing a fetched body to disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status(status) => *status == 429 || (500..600).contains(status),
            FetchError::InvalidUrl(_) | FetchError::Io(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// One HTTP GET with the implementation's timeout and retry policy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into memory
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;

    /// Fetch `url` and write a 200 body to `dest`, returning the bytes written.
    ///
    /// Any other status is reported as [`FetchError::Status`] and nothing is written.
    /// The default buffers through [`Fetcher::fetch`]; streaming implementations
    /// override it.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.fetch(url).await?;
        if !response.is_ok() {
            return Err(FetchError::Status(response.status));
        }
        tokio::fs::write(dest, &response.body).await?;
        Ok(response.body.len() as u64)
    }
}
