//! Record normalizer: loosely-typed JSON candidates to [`PaperRecord`]s.
//!
//! This is the only place a record is accepted or rejected. Every extractor,
//! whether it read embedded JSON, page markup or an API response, hands its raw
//! candidates here.

use serde_json::{Map, Value};

use super::candidates::Candidates;
use crate::models::{ArxivId, PaperRecord};

pub(crate) const TITLE_KEYS: Candidates<&str> =
    Candidates::new("title", &["title", "name", "paper_title"]);
pub(crate) const ID_KEYS: Candidates<&str> =
    Candidates::new("identifier", &["arxiv_id", "paper_id", "id"]);
pub(crate) const URL_KEYS: Candidates<&str> = Candidates::new("url", &["url", "link", "href"]);
pub(crate) const AUTHOR_KEYS: Candidates<&str> = Candidates::new("authors", &["authors", "author"]);
pub(crate) const ENVELOPE_KEYS: Candidates<&str> =
    Candidates::new("list envelope", &["papers", "data", "items", "results"]);

const DATE_KEY: &str = "date";

/// Normalize one raw candidate.
///
/// Returns `None` when no arXiv identifier can be derived, either from the
/// identifier keys or, failing that, from the URL keys. Everything else is
/// best-effort.
pub fn normalize(raw: &Value) -> Option<PaperRecord> {
    let raw = raw.as_object()?;

    let url = URL_KEYS.first(|key| raw.get(*key).and_then(scalar_string));

    let identifier = ID_KEYS
        .first(|key| {
            raw.get(*key)
                .and_then(scalar_string)
                .and_then(|value| ArxivId::parse(&value))
        })
        .or_else(|| url.as_deref().and_then(ArxivId::find_in))?;

    let title = TITLE_KEYS.first(|key| {
        raw.get(*key)
            .and_then(scalar_string)
            .filter(|title| !title.trim().is_empty())
    });

    let authors = AUTHOR_KEYS.first(|key| raw.get(*key).and_then(author_string));
    let date = raw.get(DATE_KEY).and_then(scalar_string);

    Some(
        PaperRecord::new(identifier, title)
            .with_source_url(url)
            .with_authors(authors)
            .with_observed_date(date),
    )
}

/// The shapes a paper list arrives in, resolved once at the boundary
#[derive(Debug, Clone, Copy)]
pub enum ApiPayload<'a> {
    /// A bare list of candidates
    List(&'a [Value]),
    /// An object wrapping the list under one of the envelope keys
    Envelope(&'a Map<String, Value>),
    /// Anything else; yields no candidates
    Unrecognized,
}

impl<'a> From<&'a Value> for ApiPayload<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => ApiPayload::List(items),
            Value::Object(map) => ApiPayload::Envelope(map),
            _ => ApiPayload::Unrecognized,
        }
    }
}

impl<'a> ApiPayload<'a> {
    /// The candidate list carried by this payload
    pub fn items(self) -> &'a [Value] {
        match self {
            ApiPayload::List(items) => items,
            ApiPayload::Envelope(map) => ENVELOPE_KEYS
                .first(|key| map.get(*key).and_then(Value::as_array))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            ApiPayload::Unrecognized => &[],
        }
    }
}

/// Normalize every candidate of a list-shaped payload, keeping element order
pub fn normalize_listing(value: &Value) -> Vec<PaperRecord> {
    let items = ApiPayload::from(value).items();
    let papers: Vec<PaperRecord> = items.iter().filter_map(normalize).collect();

    if papers.len() < items.len() {
        tracing::debug!(
            "Dropped {} of {} candidates without an arXiv identifier",
            items.len() - papers.len(),
            items.len()
        );
    }

    papers
}

/// Strings verbatim, numbers in their JSON rendering
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A plain string, or a list of names / `{"name": ...}` objects joined with commas
fn author_string(value: &Value) -> Option<String> {
    let joined = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.trim()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::trim),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };

    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::today;
    use serde_json::json;

    #[test]
    fn test_normalize_full_record() {
        let raw = json!({
            "title": "Attention Is Enough",
            "arxiv_id": "2401.00001",
            "url": "https://huggingface.co/papers/2401.00001",
            "authors": "A. Author, B. Author",
            "date": "2024-01-02"
        });

        let paper = normalize(&raw).unwrap();
        assert_eq!(paper.title(), "Attention Is Enough");
        assert_eq!(paper.identifier().as_str(), "2401.00001");
        assert_eq!(paper.pdf_url(), "https://arxiv.org/pdf/2401.00001.pdf");
        assert_eq!(
            paper.source_url(),
            Some("https://huggingface.co/papers/2401.00001")
        );
        assert_eq!(paper.authors(), Some("A. Author, B. Author"));
        assert_eq!(paper.observed_date(), "2024-01-02");
    }

    #[test]
    fn test_title_key_priority() {
        let raw = json!({"paper_title": "C", "name": "B", "id": "2401.1"});
        assert_eq!(normalize(&raw).unwrap().title(), "B");

        let raw = json!({"title": "", "name": "B", "id": "2401.1"});
        assert_eq!(normalize(&raw).unwrap().title(), "B");
    }

    #[test]
    fn test_identifier_key_priority_skips_invalid_values() {
        let raw = json!({"arxiv_id": "n/a", "paper_id": "2402.22222", "id": "2403.33333"});
        assert_eq!(normalize(&raw).unwrap().identifier().as_str(), "2402.22222");
    }

    #[test]
    fn test_identifier_requires_dotted_decimal() {
        assert!(normalize(&json!({"id": "2403", "name": "Z"})).is_none());
        assert_eq!(
            normalize(&json!({"id": "2403.5", "name": "Z"}))
                .unwrap()
                .identifier()
                .as_str(),
            "2403.5"
        );
    }

    #[test]
    fn test_numeric_identifier_is_stringified() {
        let paper = normalize(&json!({"id": 2401.5, "title": "Numeric"})).unwrap();
        assert_eq!(paper.identifier().as_str(), "2401.5");
    }

    #[test]
    fn test_identifier_from_url_fallback() {
        let raw = json!({"title": "Linked", "link": "https://arxiv.org/abs/2405.67890v2"});
        let paper = normalize(&raw).unwrap();
        assert_eq!(paper.identifier().as_str(), "2405.67890");
        assert_eq!(paper.source_url(), Some("https://arxiv.org/abs/2405.67890v2"));
    }

    #[test]
    fn test_reject_without_identifier_or_url() {
        assert!(normalize(&json!({"title": "No id", "authors": "Someone"})).is_none());
        assert!(normalize(&json!({"title": "Bad url", "url": "https://example.com/x"})).is_none());
        assert!(normalize(&json!("2401.00001")).is_none());
        assert!(normalize(&json!(null)).is_none());
    }

    #[test]
    fn test_missing_title_gets_placeholder_and_date_defaults() {
        let paper = normalize(&json!({"arxiv_id": "2401.00009"})).unwrap();
        assert_eq!(paper.title(), "Paper 2401.00009");
        assert_eq!(paper.observed_date(), today());
        assert!(paper.authors().is_none());
        assert!(paper.source_url().is_none());
    }

    #[test]
    fn test_author_list_shapes() {
        let raw = json!({
            "id": "2401.1",
            "authors": [{"name": "Ada"}, "Grace", {"user": "x"}, {"name": " "}]
        });
        assert_eq!(normalize(&raw).unwrap().authors(), Some("Ada, Grace"));

        let raw = json!({"id": "2401.1", "author": "Solo"});
        assert_eq!(normalize(&raw).unwrap().authors(), Some("Solo"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = json!({"title": "X", "arxiv_id": "2401.00001"});
        let first = normalize(&raw).unwrap();
        let second = normalize(&raw).unwrap();
        assert_eq!(first.pdf_url(), second.pdf_url());
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_listing_shapes() {
        let list = json!([
            {"title": "A", "arxiv_id": "2401.00001"},
            {"title": "invalid"},
            {"title": "B", "arxiv_id": "2401.00002"}
        ]);
        let titles: Vec<_> = normalize_listing(&list)
            .iter()
            .map(|p| p.title().to_string())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);

        let envelope = json!({"count": 1, "results": [{"name": "R", "id": "2401.3"}]});
        assert_eq!(normalize_listing(&envelope).len(), 1);

        let first_list_key_wins = json!({
            "papers": {"not": "a list"},
            "data": [{"title": "D", "id": "2401.4"}],
            "items": [{"title": "I", "id": "2401.5"}]
        });
        let papers = normalize_listing(&first_list_key_wins);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title(), "D");

        assert!(normalize_listing(&json!({"other": []})).is_empty());
        assert!(normalize_listing(&json!("papers")).is_empty());
    }
}
