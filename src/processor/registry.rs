//! Record of PDFs already sent to the processing service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::ProcessError;

/// Registry file name inside the state directory
pub const REGISTRY_FILE: &str = "processed_files.json";

/// One processed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    /// Local timestamp (RFC 3339)
    pub processed_at: String,
    /// Response returned by the service
    pub result: Value,
}

/// Processed files keyed by path, persisted as pretty JSON
#[derive(Debug)]
pub struct ProcessedRegistry {
    path: PathBuf,
    entries: BTreeMap<String, ProcessedEntry>,
}

impl ProcessedRegistry {
    /// Load the registry from `state_dir`.
    ///
    /// A missing file starts empty. So does an unreadable one, after logging.
    pub fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(REGISTRY_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::error!(
                    "Invalid processed-files registry {}, starting fresh: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self { path, entries }
    }

    pub fn contains(&self, pdf: &Path) -> bool {
        self.entries.contains_key(&registry_key(pdf))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pdf: &Path) -> Option<&ProcessedEntry> {
        self.entries.get(&registry_key(pdf))
    }

    /// Mark `pdf` processed and save immediately
    pub fn record(&mut self, pdf: &Path, result: Value) -> Result<(), ProcessError> {
        self.entries.insert(
            registry_key(pdf),
            ProcessedEntry {
                processed_at: chrono::Local::now().to_rfc3339(),
                result,
            },
        );
        self.save()
    }

    fn save(&self) -> Result<(), ProcessError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

fn registry_key(pdf: &Path) -> String {
    pdf.display().to_string()
}
