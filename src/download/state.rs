//! Run-summary persistence.

use std::fs;
use std::path::{Path, PathBuf};

use super::DownloadError;
use crate::models::RunSummary;

/// File in the state directory holding the last run's summary
pub const STATE_FILE: &str = "download_state.json";

/// Write `summary` as pretty JSON, creating the state directory if needed
pub fn save_summary(state_dir: &Path, summary: &RunSummary) -> Result<PathBuf, DownloadError> {
    fs::create_dir_all(state_dir)?;
    let path = state_dir.join(STATE_FILE);
    fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    Ok(path)
}

/// The last persisted summary, if any run has completed
pub fn load_summary(state_dir: &Path) -> Result<Option<RunSummary>, DownloadError> {
    let path = state_dir.join(STATE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
