//! Paper record produced by the extraction pipeline.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Base URL for arXiv PDFs
pub const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";

static LEADING_ID: OnceLock<Regex> = OnceLock::new();
static ANY_ID: OnceLock<Regex> = OnceLock::new();
static PAPERS_PATH_ID: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("identifier pattern must compile"))
}

/// A dotted numeric arXiv accession such as `2401.00001`.
///
/// Version suffixes (`v2`) are not part of the identifier, so two links to
/// different versions of the same paper deduplicate to one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArxivId(String);

impl ArxivId {
    /// Parse a value that must *start* with the identifier shape.
    ///
    /// Accepts `"2401.00001"`, `"2401.00001v3"` and `"arXiv:2401.00001"`.
    /// Rejects `"2403"` and `"see 2401.00001"`.
    pub fn parse(value: &str) -> Option<Self> {
        compiled(&LEADING_ID, r"^\s*(?i:arxiv:)?(\d+\.\d+)")
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Find the first identifier anywhere in `text` (URLs, hrefs, labels)
    pub fn find_in(text: &str) -> Option<Self> {
        compiled(&ANY_ID, r"(\d+\.\d+)")
            .find(text)
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Extract the identifier that directly follows a `/papers/` path segment
    pub fn from_papers_path(path: &str) -> Option<Self> {
        compiled(&PAPERS_PATH_ID, r"/papers/(\d+\.\d+)")
            .captures(path)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical PDF location for this identifier
    pub fn pdf_url(&self) -> String {
        format!("{}/{}.pdf", ARXIV_PDF_URL, self.0)
    }

    /// Identifier rendered safe for use in a file name
    pub fn file_stem(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl std::fmt::Display for ArxivId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Today's local date in the `YYYY-MM-DD` form used for `observed_date`
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// A normalized research paper discovered on the listing page.
///
/// Records are only created by the normalizer and never change afterwards,
/// so the fields are private. `pdf_url` is always derived from the
/// identifier, never copied from the scraped input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    title: String,
    identifier: ArxivId,
    source_url: Option<String>,
    pdf_url: String,
    authors: Option<String>,
    observed_date: String,
}

impl PaperRecord {
    /// Create a record for `identifier`; a missing or blank title becomes
    /// `"Paper {identifier}"`.
    pub(crate) fn new(identifier: ArxivId, title: Option<String>) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Paper {}", identifier));

        Self {
            title,
            pdf_url: identifier.pdf_url(),
            identifier,
            source_url: None,
            authors: None,
            observed_date: today(),
        }
    }

    pub(crate) fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    pub(crate) fn with_authors(mut self, authors: Option<String>) -> Self {
        self.authors = authors;
        self
    }

    pub(crate) fn with_observed_date(mut self, date: Option<String>) -> Self {
        if let Some(date) = date {
            self.observed_date = date;
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn identifier(&self) -> &ArxivId {
        &self.identifier
    }

    /// Page link, when the source provided one
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn pdf_url(&self) -> &str {
        &self.pdf_url
    }

    pub fn authors(&self) -> Option<&str> {
        self.authors.as_deref()
    }

    /// Provenance date: the source's `date` value verbatim, or the day the record was observed
    pub fn observed_date(&self) -> &str {
        &self.observed_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_leading_identifier() {
        assert_eq!(ArxivId::parse("2401.00001").unwrap().as_str(), "2401.00001");
        assert_eq!(ArxivId::parse("2401.00001v2").unwrap().as_str(), "2401.00001");
        assert_eq!(ArxivId::parse("arXiv:2402.1").unwrap().as_str(), "2402.1");
        assert_eq!(ArxivId::parse("2403.5").unwrap().as_str(), "2403.5");
        assert!(ArxivId::parse("2403").is_none());
        assert!(ArxivId::parse("paper 2401.00001").is_none());
        assert!(ArxivId::parse("").is_none());
    }

    #[test]
    fn test_find_in_url() {
        let id = ArxivId::find_in("https://arxiv.org/abs/2401.12345v1").unwrap();
        assert_eq!(id.as_str(), "2401.12345");
        assert!(ArxivId::find_in("https://example.com/about").is_none());
    }

    #[test]
    fn test_from_papers_path() {
        let id = ArxivId::from_papers_path("/papers/2402.12345").unwrap();
        assert_eq!(id.as_str(), "2402.12345");
        assert!(ArxivId::from_papers_path("/papers/trending").is_none());
    }

    #[test]
    fn test_pdf_url_is_derived() {
        let id = ArxivId::parse("2401.00001").unwrap();
        assert_eq!(id.pdf_url(), "https://arxiv.org/pdf/2401.00001.pdf");
        assert_eq!(id.to_string(), "2401.00001");
    }

    #[test]
    fn test_record_placeholder_title() {
        let id = ArxivId::parse("2401.00001").unwrap();
        let record = PaperRecord::new(id.clone(), Some("   ".to_string()));
        assert_eq!(record.title(), "Paper 2401.00001");
        assert_eq!(record.pdf_url(), id.pdf_url());
        assert_eq!(record.observed_date(), today());
    }

    #[test]
    fn test_record_builder_fields() {
        let record = PaperRecord::new(ArxivId::parse("2401.00001").unwrap(), Some(" X ".into()))
            .with_source_url(Some("https://huggingface.co/papers/2401.00001".into()))
            .with_authors(Some("Ada Lovelace".into()))
            .with_observed_date(Some("2024-01-02".into()));

        assert_eq!(record.title(), "X");
        assert_eq!(
            record.source_url(),
            Some("https://huggingface.co/papers/2401.00001")
        );
        assert_eq!(record.authors(), Some("Ada Lovelace"));
        assert_eq!(record.observed_date(), "2024-01-02");
    }
}
