//! Multi-strategy paper extraction.
//!
//! The cascade, each step tried only when the previous one produced nothing:
//!
//! 1. Structured data embedded in the listing page ([`extract_structured`])
//! 2. The page markup ([`extract_markup`])
//! 3. Alternate JSON endpoints, probed in configured order
//!
//! The winning list is deduplicated by identifier and truncated to the
//! configured paper cap. Parse failures anywhere only mean "nothing from this
//! branch"; they never abort the cascade.

mod candidates;
mod markup;
mod normalize;
mod structured;

pub use markup::extract_markup;
pub use normalize::{normalize, normalize_listing, ApiPayload};
pub use structured::extract_structured;

use scraper::Html;
use std::sync::Arc;
use url::Url;

use crate::config::{ConfigError, ListingConfig};
use crate::fetch::Fetcher;
use crate::models::{Extraction, ListingStatus, PaperRecord, Strategy};
use crate::utils::deduplicate_papers;

/// Failures inside one extraction branch. Logged, then treated as "no papers".
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Unexpected shape: {0}")]
    UnexpectedShape(String),
}

/// Drives the extraction cascade against one listing site
pub struct PaperExtractor {
    fetcher: Arc<dyn Fetcher>,
    listing: ListingConfig,
    base_url: Url,
}

impl PaperExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, listing: ListingConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&listing.base_url).map_err(|e| {
            ConfigError::Invalid(format!("listing.base_url {:?}: {}", listing.base_url, e))
        })?;

        Ok(Self {
            fetcher,
            listing,
            base_url,
        })
    }

    /// URL of the daily listing page
    pub fn listing_url(&self) -> String {
        self.site_url(&self.listing.papers_path)
    }

    /// Alternate endpoints in probe order
    pub fn endpoint_urls(&self) -> Vec<String> {
        self.listing
            .api_endpoints
            .iter()
            .map(|path| self.site_url(path))
            .collect()
    }

    /// Absolute URLs pass through; paths are appended to the configured base
    fn site_url(&self, path: &str) -> String {
        if Url::parse(path).is_ok() {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.listing.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Run the cascade and return the final, ordered paper list with its status
    pub async fn get_papers(&self) -> Extraction {
        let mut reached = false;

        let mut found = match self.fetch_body(&self.listing_url()).await {
            Some(body) => {
                reached = true;
                self.extract_document(&body)
            }
            None => None,
        };

        if found.is_none() {
            found = self.probe_endpoints(&mut reached).await;
        }

        let Some((papers, strategy)) = found else {
            let status = if reached {
                tracing::warn!("No papers could be extracted from any source");
                ListingStatus::NothingFound
            } else {
                tracing::warn!("Listing page and all API endpoints were unreachable");
                ListingStatus::Unreachable
            };
            return Extraction {
                papers: Vec::new(),
                status,
            };
        };

        let mut papers = deduplicate_papers(papers);
        if let Some(limit) = self.listing.limit() {
            papers.truncate(limit);
        }

        tracing::info!("Found {} papers via {}", papers.len(), strategy);
        Extraction {
            papers,
            status: ListingStatus::Found(strategy),
        }
    }

    /// Structured data, then markup, over one listing document.
    ///
    /// Synchronous so the parsed tree never lives across an await point.
    pub fn extract_document(&self, html: &str) -> Option<(Vec<PaperRecord>, Strategy)> {
        let document = Html::parse_document(html);

        let papers = extract_structured(&document);
        if !papers.is_empty() {
            return Some((papers, Strategy::Structured));
        }

        tracing::info!("No embedded paper data, falling back to page markup");
        let papers = extract_markup(&document, &self.base_url, self.listing.limit());
        if !papers.is_empty() {
            return Some((papers, Strategy::Markup));
        }

        tracing::info!("Listing page markup yielded no papers");
        None
    }

    async fn probe_endpoints(&self, reached: &mut bool) -> Option<(Vec<PaperRecord>, Strategy)> {
        for endpoint in self.endpoint_urls() {
            tracing::info!("Trying API endpoint {}", endpoint);

            let Some(body) = self.fetch_body(&endpoint).await else {
                continue;
            };
            *reached = true;

            match papers_from_api_body(&body) {
                Ok(papers) if !papers.is_empty() => {
                    tracing::info!("API endpoint {} returned {} papers", endpoint, papers.len());
                    return Some((papers, Strategy::ApiEndpoint(endpoint)));
                }
                Ok(_) => tracing::debug!("API endpoint {} returned no papers", endpoint),
                Err(e) => tracing::debug!("API endpoint {} failed: {}", endpoint, e),
            }
        }

        None
    }

    /// Body of a 200 response; anything else is logged and means "no data"
    async fn fetch_body(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(response) if response.is_ok() => Some(response.text()),
            Ok(response) => {
                tracing::warn!("Fetching {} returned status {}", url, response.status);
                None
            }
            Err(e) => {
                tracing::warn!("Fetching {} failed: {}", url, e);
                None
            }
        }
    }
}

fn papers_from_api_body(body: &str) -> Result<Vec<PaperRecord>, ExtractError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let ApiPayload::Unrecognized = ApiPayload::from(&value) {
        return Err(ExtractError::UnexpectedShape(
            "expected a list or an object".to_string(),
        ));
    }
    Ok(normalize_listing(&value))
}
