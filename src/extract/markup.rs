//! Markup extraction: structural selectors over the rendered listing, then a
//! last-resort scan for arXiv links anywhere on the page.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use url::Url;

use super::candidates::Candidates;
use super::normalize::normalize;
use crate::models::{ArxivId, PaperRecord};

/// Container selectors in priority order; the first with any match is used alone
pub(crate) const CONTAINER_SELECTORS: Candidates<&str> = Candidates::new(
    "container selector",
    &[
        "article",
        r#"div[class*="paper"]"#,
        r#"a[href*="/papers/"]"#,
        r#"div[data-test*="paper"]"#,
        "section article",
        "main article",
    ],
);

const HEADING_TAGS: [&str; 5] = ["h1", "h2", "h3", "h4", "h5"];

const ARXIV_HOST: &str = "arxiv.org";

/// How far up from an arXiv link to look for a title-sized block of text
const TITLE_ANCESTOR_LEVELS: usize = 3;

static AUTHOR_MARKER: OnceLock<Regex> = OnceLock::new();

fn author_marker() -> &'static Regex {
    AUTHOR_MARKER
        .get_or_init(|| Regex::new(r"(?is)\bby\s+(.+)").expect("author pattern must compile"))
}

/// Recover papers from the page structure.
///
/// `limit` caps how many container elements (or arXiv links) are inspected.
/// Relative links are resolved against `base`.
pub fn extract_markup(document: &Html, base: &Url, limit: Option<usize>) -> Vec<PaperRecord> {
    let papers = from_containers(document, base, limit);
    if !papers.is_empty() {
        return papers;
    }

    let papers = from_arxiv_links(document, base, limit);
    if !papers.is_empty() {
        tracing::info!("Recovered {} papers from arXiv links", papers.len());
    }
    papers
}

fn from_containers(document: &Html, base: &Url, limit: Option<usize>) -> Vec<PaperRecord> {
    let Some((css, elements)) = CONTAINER_SELECTORS.first_with(|css| {
        let selector = Selector::parse(css).ok()?;
        let found: Vec<ElementRef<'_>> = document.select(&selector).collect();
        (!found.is_empty()).then_some(found)
    }) else {
        tracing::debug!("No {} matched the listing page", CONTAINER_SELECTORS.label());
        return Vec::new();
    };

    tracing::info!("Selector '{}' matched {} elements", css, elements.len());

    let inspected = limit.unwrap_or(elements.len());
    elements
        .into_iter()
        .take(inspected)
        .filter_map(|element| paper_from_element(element, base))
        .collect()
}

fn paper_from_element(element: ElementRef<'_>, base: &Url) -> Option<PaperRecord> {
    let mut identifier = None;
    let mut url = None;

    for anchor in anchors(element) {
        let Some(link) = resolved_href(anchor, base) else {
            continue;
        };

        if link.path().contains("/papers/") {
            if let Some(id) = ArxivId::from_papers_path(link.path()) {
                identifier = Some(id);
            }
            url = Some(link.to_string());
        } else if is_arxiv_host(&link) {
            if let Some(id) = ArxivId::find_in(link.path()) {
                identifier = Some(id);
                url = Some(link.to_string());
            }
        }
    }

    let identifier = identifier?;

    let mut raw = Map::new();
    raw.insert("arxiv_id".to_string(), Value::String(identifier.to_string()));
    if let Some(title) = element_title(element) {
        raw.insert("title".to_string(), Value::String(title));
    }
    if let Some(url) = url {
        raw.insert("url".to_string(), Value::String(url));
    }
    if let Some(authors) = element_authors(element) {
        raw.insert("authors".to_string(), Value::String(authors));
    }

    normalize(&Value::Object(raw))
}

/// The element itself when it is an anchor, then its descendant anchors
fn anchors<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
}

fn resolved_href(anchor: ElementRef<'_>, base: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?;
    base.join(href.trim()).ok()
}

fn is_arxiv_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == ARXIV_HOST || host.ends_with(&format!(".{}", ARXIV_HOST))
    })
}

/// Text nodes trimmed and joined with single spaces
fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty heading, by level, else the first non-empty anchor text
fn element_title(element: ElementRef<'_>) -> Option<String> {
    HEADING_TAGS
        .iter()
        .find_map(|tag| {
            element
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == *tag)
                .and_then(non_empty_text)
        })
        .or_else(|| anchors(element).find_map(non_empty_text))
}

fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    Some(joined_text(element)).filter(|text| !text.is_empty())
}

fn element_authors(element: ElementRef<'_>) -> Option<String> {
    element.text().find_map(|text| {
        author_marker()
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|authors| !authors.is_empty())
    })
}

fn from_arxiv_links(document: &Html, base: &Url, limit: Option<usize>) -> Vec<PaperRecord> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let link = resolved_href(anchor, base)?;
            is_arxiv_host(&link).then_some((anchor, link))
        })
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(|(anchor, link)| paper_from_arxiv_link(anchor, &link))
        .collect()
}

fn paper_from_arxiv_link(anchor: ElementRef<'_>, link: &Url) -> Option<PaperRecord> {
    let identifier = ArxivId::find_in(link.path())?;

    let title = anchor
        .ancestors()
        .take(TITLE_ANCESTOR_LEVELS)
        .filter_map(ElementRef::wrap)
        .map(joined_text)
        .find(|text| (11..300).contains(&text.chars().count()))
        .or_else(|| non_empty_text(anchor));

    let mut raw = Map::new();
    raw.insert("arxiv_id".to_string(), Value::String(identifier.to_string()));
    raw.insert("url".to_string(), Value::String(link.to_string()));
    if let Some(title) = title {
        raw.insert("title".to_string(), Value::String(title));
    }

    normalize(&Value::Object(raw))
}
