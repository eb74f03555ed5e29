//! Core data models for discovered papers and run outcomes.

mod paper;
mod run;

pub use paper::{today, ArxivId, PaperRecord, ARXIV_PDF_URL};
pub use run::{DownloadedPaper, Extraction, ListingStatus, RunSummary, Strategy};
