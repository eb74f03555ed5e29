//! Download driver: fetch each extracted paper's PDF into the download directory.
//!
//! Files are named `{identifier}_{slug}.pdf`. A file that already exists is
//! skipped, which makes repeated daily runs idempotent. Each PDF gets a JSON
//! sidecar holding its record so later stages can send metadata with it.

mod state;

pub use state::{load_summary, save_summary, STATE_FILE};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::extract::PaperExtractor;
use crate::fetch::{FetchError, Fetcher};
use crate::models::{DownloadedPaper, ListingStatus, PaperRecord, RunSummary};

/// Longest title slug kept in a file name
const MAX_SLUG_CHARS: usize = 100;

/// Suffix of a download still in progress
pub const PARTIAL_SUFFIX: &str = "part";

static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
static SEPARATOR_RUNS: OnceLock<Regex> = OnceLock::new();

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Title reduced to word characters joined by single dashes, at most 100 characters
pub fn slugify(title: &str) -> String {
    let unsafe_chars = UNSAFE_CHARS
        .get_or_init(|| Regex::new(r"[^\w\s-]").expect("slug pattern must compile"));
    let separators = SEPARATOR_RUNS
        .get_or_init(|| Regex::new(r"[-\s]+").expect("slug pattern must compile"));

    let cleaned = unsafe_chars.replace_all(title, "");
    separators
        .replace_all(&cleaned, "-")
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}

/// File name for a paper's PDF
pub fn paper_filename(paper: &PaperRecord) -> String {
    format!(
        "{}_{}.pdf",
        paper.identifier().file_stem(),
        slugify(paper.title())
    )
}

/// Downloads the papers found by a [`PaperExtractor`]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    extractor: PaperExtractor,
    download_dir: PathBuf,
    state_dir: PathBuf,
    delay: Duration,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Result<Self, ConfigError> {
        let extractor = PaperExtractor::new(Arc::clone(&fetcher), config.listing.clone())?;

        Ok(Self {
            fetcher,
            extractor,
            download_dir: config.paths.download_dir.clone(),
            state_dir: config.paths.state_dir.clone(),
            delay: config.http.request_delay(),
        })
    }

    /// Pause between successful downloads
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn extractor(&self) -> &PaperExtractor {
        &self.extractor
    }

    /// One full pass: extract, download, persist the summary.
    ///
    /// An empty listing is not an error; it returns an empty summary and
    /// leaves the previous state file untouched.
    pub async fn run(&self) -> Result<RunSummary, DownloadError> {
        tracing::info!("Starting daily paper run");

        let extraction = self.extractor.get_papers().await;
        if extraction.is_empty() {
            match extraction.status {
                ListingStatus::Unreachable => {
                    tracing::warn!("Could not reach the listing or any API endpoint")
                }
                _ => tracing::warn!("No papers found today"),
            }
            return Ok(RunSummary::new(0, &[]));
        }

        let downloaded = self.download_papers(&extraction.papers).await?;
        let summary = RunSummary::new(extraction.papers.len(), &downloaded);

        let path = save_summary(&self.state_dir, &summary)?;
        tracing::info!(
            "Run complete: {} found, {} downloaded (state saved to {})",
            summary.papers_found,
            summary.papers_downloaded,
            path.display()
        );

        Ok(summary)
    }

    /// Download every paper in order, skipping existing files and logging failures
    pub async fn download_papers(
        &self,
        papers: &[PaperRecord],
    ) -> Result<Vec<DownloadedPaper>, DownloadError> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let mut downloaded = Vec::new();
        for (index, paper) in papers.iter().enumerate() {
            match self.download_paper(paper).await {
                Ok(Some(path)) => {
                    tracing::info!("Downloaded {}", path.display());
                    downloaded.push(DownloadedPaper {
                        paper: paper.clone(),
                        filepath: path.display().to_string(),
                    });

                    if index + 1 < papers.len() && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to download {}: {}", paper.identifier(), e),
            }
        }

        Ok(downloaded)
    }

    /// `Ok(None)` when the file already exists
    async fn download_paper(&self, paper: &PaperRecord) -> Result<Option<PathBuf>, DownloadError> {
        let path = self.download_dir.join(paper_filename(paper));
        if tokio::fs::try_exists(&path).await? {
            tracing::info!("Already downloaded, skipping: {}", path.display());
            return Ok(None);
        }

        let partial = path.with_extension(format!("pdf.{}", PARTIAL_SUFFIX));
        tracing::debug!("Fetching {} -> {}", paper.pdf_url(), partial.display());

        match self.fetcher.fetch_to_file(paper.pdf_url(), &partial).await {
            Ok(bytes) => tracing::debug!("Wrote {} bytes for {}", bytes, paper.identifier()),
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e.into());
            }
        }

        tokio::fs::rename(&partial, &path).await?;
        tokio::fs::write(sidecar_path(&path), serde_json::to_vec_pretty(paper)?).await?;

        Ok(Some(path))
    }
}

/// Metadata file stored next to a PDF
pub fn sidecar_path(pdf: &Path) -> PathBuf {
    pdf.with_extension("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArxivId;

    fn paper(id: &str, title: &str) -> PaperRecord {
        PaperRecord::new(ArxivId::parse(id).unwrap(), Some(title.to_string()))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Attention Is All You Need"), "Attention-Is-All-You-Need");
        assert_eq!(slugify("GPT-4: A  Report (v2)!"), "GPT-4-A-Report-v2");
        assert_eq!(slugify("a - b"), "a-b");
        assert_eq!(slugify(&"x".repeat(150)).len(), 100);
    }

    #[test]
    fn test_paper_filename() {
        assert_eq!(
            paper_filename(&paper("2401.00001", "Deep Nets: A Survey")),
            "2401.00001_Deep-Nets-A-Survey.pdf"
        );
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("papers/2401.00001_X.pdf")),
            PathBuf::from("papers/2401.00001_X.json")
        );
    }
}
