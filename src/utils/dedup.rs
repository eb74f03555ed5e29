//! Deduplication of discovered papers.

use std::collections::HashSet;

use crate::models::PaperRecord;

/// Remove records whose identifier was already seen.
///
/// The first occurrence wins and discovery order is preserved.
pub fn deduplicate_papers(papers: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen = HashSet::new();
    let before = papers.len();

    let unique: Vec<PaperRecord> = papers
        .into_iter()
        .filter(|paper| seen.insert(paper.identifier().clone()))
        .collect();

    if unique.len() < before {
        tracing::debug!("Dropped {} duplicate papers", before - unique.len());
    }

    unique
}
