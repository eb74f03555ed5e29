//! reqwest-backed [`Fetcher`].

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::{FetchError, FetchResponse, Fetcher};
use crate::config::HttpConfig;
use crate::utils::{with_retry, RetryConfig};

/// HTTP fetcher with browser-like default headers and retry on transient failures
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Build a fetcher from the `[http]` configuration section
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: RetryConfig::from_http(config),
        })
    }

    /// Override the retry policy (tests use millisecond delays)
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        with_retry(self.retry, || {
            let request = self.client.get(parsed.clone());
            async move {
                let response = request.send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                Ok(response)
            }
        })
        .await
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::Network(format!("Invalid header value {:?}: {}", value, e)))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        if status != 200 {
            tracing::debug!("{} returned status {}", url, status);
        }

        let body = response.bytes().await?;
        Ok(FetchResponse::new(status, body.to_vec()))
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.send(url).await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let file = tokio::fs::File::create(dest).await?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }

        writer.flush().await?;
        Ok(bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig::default())
            .unwrap()
            .with_retry_config(RetryConfig {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_multiplier: 2.0,
            })
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/papers")
            .match_header("accept-language", "en-US,en;q=0.9")
            .match_header("user-agent", mockito::Matcher::Regex("Mozilla".to_string()))
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let response = fast_fetcher()
            .fetch(&format!("{}/papers", server.url()))
            .await
            .unwrap();

        assert!(response.is_ok());
        assert_eq!(response.text(), "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_passes_through_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let response = fast_fetcher()
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let result = fast_fetcher()
            .fetch(&format!("{}/flaky", server.url()))
            .await;

        assert!(matches!(result, Err(FetchError::Status(503))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let result = fast_fetcher().fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_to_file_streams_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pdf/2401.00001.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.4 test".to_vec())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("paper.pdf");

        let written = fast_fetcher()
            .fetch_to_file(&format!("{}/pdf/2401.00001.pdf", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.4 test");
    }
}
