//! Outcome models for one extraction and download run.

use serde::{Deserialize, Serialize};

use super::PaperRecord;

/// Which step of the extraction cascade produced the paper list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Embedded application-state JSON or other script JSON on the listing page
    Structured,
    /// Structural selectors or arXiv link scanning on the listing page
    Markup,
    /// An alternate JSON endpoint, identified by its URL
    ApiEndpoint(String),
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Structured => write!(f, "structured data"),
            Strategy::Markup => write!(f, "markup"),
            Strategy::ApiEndpoint(url) => write!(f, "API endpoint {}", url),
        }
    }
}

/// How the extraction ended.
///
/// An empty paper list is a normal result; the status tells callers whether
/// the sources answered with nothing usable or could not be reached at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "strategy", rename_all = "snake_case")]
pub enum ListingStatus {
    Found(Strategy),
    /// At least one source responded but no records could be recovered
    NothingFound,
    /// The listing page and every API endpoint failed to fetch
    Unreachable,
}

/// Final, deduplicated and truncated result of the extraction cascade
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub papers: Vec<PaperRecord>,
    pub status: ListingStatus,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

/// A paper whose PDF was written during this run
#[derive(Debug, Clone, Serialize)]
pub struct DownloadedPaper {
    pub paper: PaperRecord,
    pub filepath: String,
}

/// Summary persisted after each run to `download_state.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Local timestamp of the run (RFC 3339)
    pub last_run: String,
    pub papers_found: usize,
    pub papers_downloaded: usize,
    pub downloaded_files: Vec<String>,
}

impl RunSummary {
    pub fn new(papers_found: usize, downloaded: &[DownloadedPaper]) -> Self {
        Self {
            last_run: chrono::Local::now().to_rfc3339(),
            papers_found,
            papers_downloaded: downloaded.len(),
            downloaded_files: downloaded.iter().map(|d| d.filepath.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArxivId;

    #[test]
    fn test_run_summary_counts() {
        let paper = PaperRecord::new(ArxivId::parse("2401.00001").unwrap(), Some("X".into()));
        let downloaded = vec![DownloadedPaper {
            paper,
            filepath: "downloaded_papers/2401.00001_X.pdf".to_string(),
        }];

        let summary = RunSummary::new(3, &downloaded);
        assert_eq!(summary.papers_found, 3);
        assert_eq!(summary.papers_downloaded, 1);
        assert_eq!(
            summary.downloaded_files,
            vec!["downloaded_papers/2401.00001_X.pdf".to_string()]
        );
        assert!(!summary.last_run.is_empty());
    }

    #[test]
    fn test_listing_status_serialization() {
        let status = ListingStatus::Found(Strategy::ApiEndpoint("https://x/api".into()));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["strategy"]["api_endpoint"], "https://x/api");

        let json = serde_json::to_value(ListingStatus::NothingFound).unwrap();
        assert_eq!(json["status"], "nothing_found");
    }
}
