//! Structured-data extraction from JSON embedded in the listing page.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

use super::normalize::normalize_listing;
use super::ExtractError;
use crate::models::PaperRecord;

/// The serialized application state rendered by the listing page
const APP_STATE_SCRIPT_ID: &str = "__NEXT_DATA__";

/// Deepest level of the state tree that is inspected
const MAX_DEPTH: usize = 10;

/// Keys whose presence in a list's first element marks it as a paper list
const PAPER_MARKER_KEYS: [&str; 3] = ["title", "arxiv_id", "paper_id"];

const PAPERS_KEY: &str = "papers";

static INLINE_JSON: OnceLock<Regex> = OnceLock::new();

fn inline_json_pattern() -> &'static Regex {
    INLINE_JSON.get_or_init(|| {
        Regex::new(r#"(?s)\{.*"papers".*\}"#).expect("inline JSON pattern must compile")
    })
}

/// Recover papers from embedded JSON.
///
/// Tries the application-state script first, then any other script whose
/// text mentions `papers`. Never fails: malformed JSON only means this
/// strategy found nothing.
pub fn extract_structured(document: &Html) -> Vec<PaperRecord> {
    let papers = from_app_state(document);
    if !papers.is_empty() {
        tracing::info!("Extracted {} papers from {}", papers.len(), APP_STATE_SCRIPT_ID);
        return papers;
    }

    let papers = from_inline_scripts(document);
    if !papers.is_empty() {
        tracing::info!("Extracted {} papers from inline script JSON", papers.len());
    }
    papers
}

fn scripts(document: &Html) -> impl Iterator<Item = scraper::ElementRef<'_>> {
    // "script" always parses
    let selector = Selector::parse("script").ok();
    selector
        .into_iter()
        .flat_map(move |selector| document.select(&selector).collect::<Vec<_>>())
}

fn from_app_state(document: &Html) -> Vec<PaperRecord> {
    let Some(script) = scripts(document).find(|s| s.value().id() == Some(APP_STATE_SCRIPT_ID))
    else {
        return Vec::new();
    };

    let text: String = script.text().collect();
    match serde_json::from_str::<Value>(&text) {
        Ok(state) => search_tree(&state),
        Err(e) => {
            tracing::debug!("{} is not valid JSON: {}", APP_STATE_SCRIPT_ID, e);
            Vec::new()
        }
    }
}

fn from_inline_scripts(document: &Html) -> Vec<PaperRecord> {
    for script in scripts(document) {
        if script.value().id() == Some(APP_STATE_SCRIPT_ID) {
            continue;
        }

        let text: String = script.text().collect();
        if !text.to_lowercase().contains(PAPERS_KEY) {
            continue;
        }

        match papers_from_script_text(&text) {
            Ok(papers) if !papers.is_empty() => return papers,
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping inline script: {}", e),
        }
    }

    Vec::new()
}

/// Parse the outermost brace-delimited object that mentions `"papers"`
fn papers_from_script_text(text: &str) -> Result<Vec<PaperRecord>, ExtractError> {
    let literal = inline_json_pattern()
        .find(text)
        .ok_or_else(|| ExtractError::UnexpectedShape("no object literal mentions \"papers\"".into()))?;

    let value: Value = serde_json::from_str(literal.as_str())?;
    Ok(papers_from_value(&value))
}

fn papers_from_value(value: &Value) -> Vec<PaperRecord> {
    match value {
        Value::Object(map) if map.contains_key(PAPERS_KEY) => normalize_listing(&map[PAPERS_KEY]),
        Value::Array(_) => normalize_listing(value),
        _ => search_tree(value),
    }
}

fn looks_like_paper_list(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| PAPER_MARKER_KEYS.iter().any(|key| first.contains_key(*key)))
}

/// Depth-first search of a JSON tree for the first non-empty paper list.
///
/// Uses an explicit stack carrying depth. Children are pushed in reverse so
/// nodes are visited in document order. A node that looks like a paper list
/// but normalizes to nothing is not descended into.
pub(crate) fn search_tree(root: &Value) -> Vec<PaperRecord> {
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            continue;
        }

        match node {
            Value::Object(map) => {
                if let Some(candidate) = map.get(PAPERS_KEY) {
                    let papers = normalize_listing(candidate);
                    if !papers.is_empty() {
                        return papers;
                    }
                    continue;
                }
                stack.extend(map.values().rev().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                if looks_like_paper_list(items) {
                    let papers = normalize_listing(node);
                    if !papers.is_empty() {
                        return papers;
                    }
                    continue;
                }
                stack.extend(items.iter().rev().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }

    Vec::new()
}
