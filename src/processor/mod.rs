//! Hand downloaded PDFs to the processing service.
//!
//! [`PdfProcessor`] sends each PDF once: existing files first (optionally),
//! then new ones as the [`DirectoryWatcher`] discovers them. Processed paths
//! are remembered in a [`ProcessedRegistry`] so restarts do not resend.

mod client;
mod registry;
mod watcher;

pub use client::ProcessingClient;
pub use registry::{ProcessedEntry, ProcessedRegistry, REGISTRY_FILE};
pub use watcher::{is_pdf, scan_pdfs, DirectoryWatcher};

use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::download::sidecar_path;

/// Pause between noticing a new PDF and sending it
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Processing errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Not a readable PDF: {0}")]
    InvalidPdf(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processing service error: {0}")]
    Service(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProcessError {
    fn from(err: reqwest::Error) -> Self {
        ProcessError::Service(err.to_string())
    }
}

pub struct PdfProcessor {
    client: ProcessingClient,
    registry: ProcessedRegistry,
    download_dir: PathBuf,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl PdfProcessor {
    pub fn new(config: &Config) -> Result<Self, ProcessError> {
        std::fs::create_dir_all(&config.paths.download_dir)?;

        Ok(Self {
            client: ProcessingClient::new(&config.processor)?,
            registry: ProcessedRegistry::load(&config.paths.state_dir),
            download_dir: config.paths.download_dir.clone(),
            poll_interval: Duration::from_secs(config.processor.poll_interval_secs.max(1)),
            settle_delay: DEFAULT_SETTLE_DELAY,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn registry(&self) -> &ProcessedRegistry {
        &self.registry
    }

    /// Send one PDF to the service.
    ///
    /// Returns `Ok(None)` if it was processed before.
    pub async fn process_pdf(&mut self, pdf: &Path) -> Result<Option<Value>, ProcessError> {
        if self.registry.contains(pdf) {
            tracing::info!("Skipping already processed file: {}", pdf.display());
            return Ok(None);
        }

        if !is_pdf(pdf) || !tokio::fs::try_exists(pdf).await? {
            return Err(ProcessError::InvalidPdf(pdf.to_path_buf()));
        }

        tracing::info!("Processing PDF: {}", pdf.display());
        let metadata = load_metadata(pdf).await;
        let result = self.client.submit(pdf, &metadata).await?;

        self.registry.record(pdf, result.clone())?;
        tracing::info!("Successfully processed {}", pdf.display());

        Ok(Some(result))
    }

    /// Process every PDF already under the download directory.
    ///
    /// Individual failures are logged; returns how many were processed now.
    pub async fn process_existing(
        &mut self,
        sink: &mut impl FnMut(&Path, &Value),
    ) -> Result<usize, ProcessError> {
        let pdfs = scan_pdfs(&self.download_dir)?;
        tracing::info!(
            "Found {} existing PDF files in {}",
            pdfs.len(),
            self.download_dir.display()
        );

        let mut processed = 0;
        for pdf in pdfs {
            if self.handle(&pdf, sink).await {
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Poll the download directory until `shutdown` resolves, processing new PDFs
    pub async fn watch<S>(
        &mut self,
        shutdown: S,
        sink: &mut impl FnMut(&Path, &Value),
    ) -> Result<(), ProcessError>
    where
        S: Future<Output = ()>,
    {
        let mut watcher = DirectoryWatcher::new(&self.download_dir, self.poll_interval)?;
        tokio::pin!(shutdown);

        tracing::info!("Watching for new PDFs in {}", watcher.root().display());

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Processor shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(watcher.interval()) => {}
            }

            let created = match watcher.poll() {
                Ok(created) => created,
                Err(e) => {
                    tracing::warn!("Failed to scan {}: {}", watcher.root().display(), e);
                    continue;
                }
            };

            for pdf in created {
                tracing::info!("New PDF detected: {}", pdf.display());
                tokio::time::sleep(self.settle_delay).await;
                self.handle(&pdf, sink).await;
            }
        }
    }

    /// Process one file, reporting a fresh result to `sink`
    async fn handle(&mut self, pdf: &Path, sink: &mut impl FnMut(&Path, &Value)) -> bool {
        match self.process_pdf(pdf).await {
            Ok(Some(result)) => {
                sink(pdf, &result);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!("Error processing {}: {}", pdf.display(), e);
                false
            }
        }
    }
}

/// The PDF's sidecar metadata, or an empty object
async fn load_metadata(pdf: &Path) -> Value {
    let path = sidecar_path(pdf);
    let Ok(content) = tokio::fs::read_to_string(&path).await else {
        return Value::Object(Default::default());
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Invalid metadata format for {}: {}", pdf.display(), e);
        Value::Object(Default::default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathsConfig, ProcessorConfig};
    use mockito::Matcher;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(temp: &TempDir, service_url: String) -> Config {
        Config {
            paths: PathsConfig {
                download_dir: temp.path().join("downloads"),
                state_dir: temp.path().join("state"),
            },
            processor: ProcessorConfig {
                service_url,
                request_timeout_secs: 5,
                ..ProcessorConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_process_pdf_once_with_sidecar_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/process")
            .match_body(Matcher::Regex("Sidecar Title".to_string()))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .expect(1)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let config = config_for(&temp, format!("{}/process", server.url()));
        let mut processor = PdfProcessor::new(&config).unwrap();

        let pdf = config.paths.download_dir.join("2401.00001_X.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        fs::write(sidecar_path(&pdf), r#"{"title": "Sidecar Title"}"#).unwrap();

        let result = processor.process_pdf(&pdf).await.unwrap();
        assert_eq!(result.unwrap()["ok"], true);
        assert!(processor.process_pdf(&pdf).await.unwrap().is_none());
        assert!(processor.registry().contains(&pdf));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejects_missing_and_non_pdf_files() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp, "http://127.0.0.1:9/process".to_string());
        let mut processor = PdfProcessor::new(&config).unwrap();

        let missing = config.paths.download_dir.join("missing.pdf");
        assert!(matches!(
            processor.process_pdf(&missing).await,
            Err(ProcessError::InvalidPdf(_))
        ));

        let text = config.paths.download_dir.join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        assert!(matches!(
            processor.process_pdf(&text).await,
            Err(ProcessError::InvalidPdf(_))
        ));
    }

    #[tokio::test]
    async fn test_process_existing_continues_after_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/process")
            .match_body(Matcher::Regex("bad.pdf".to_string()))
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("POST", "/process")
            .match_body(Matcher::Regex("good.pdf".to_string()))
            .with_status(200)
            .with_body(r#"{"id": 1}"#)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let config = config_for(&temp, format!("{}/process", server.url()));
        let mut processor = PdfProcessor::new(&config).unwrap();

        let nested = config.paths.download_dir.join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(config.paths.download_dir.join("bad.pdf"), b"%PDF").unwrap();
        fs::write(nested.join("good.pdf"), b"%PDF").unwrap();

        let mut seen = Vec::new();
        let processed = processor
            .process_existing(&mut |path: &Path, _: &Value| seen.push(path.to_path_buf()))
            .await
            .unwrap();

        assert_eq!(processed, 1);
        assert_eq!(seen, vec![nested.join("good.pdf")]);
        assert_eq!(processor.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_watch_processes_new_pdfs_until_shutdown() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/process")
            .with_status(200)
            .with_body(r#"{"done": true}"#)
            .expect(1)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let config = config_for(&temp, format!("{}/process", server.url()));
        let download_dir = config.paths.download_dir.clone();
        let mut processor = PdfProcessor::new(&config)
            .unwrap()
            .with_poll_interval(Duration::from_millis(20))
            .with_settle_delay(Duration::ZERO);

        let mut results = Vec::new();
        let mut sink = |path: &Path, value: &Value| results.push((path.to_path_buf(), value.clone()));

        let writer = async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            fs::write(download_dir.join("fresh.pdf.part"), b"%PDF").unwrap();
            fs::rename(
                download_dir.join("fresh.pdf.part"),
                download_dir.join("fresh.pdf"),
            )
            .unwrap();
        };
        let shutdown = tokio::time::sleep(Duration::from_millis(500));

        let (outcome, _) = tokio::join!(processor.watch(shutdown, &mut sink), writer);
        outcome.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, download_dir.join("fresh.pdf"));
        assert_eq!(results[0].1["done"], true);
        mock.assert_async().await;
    }
}
