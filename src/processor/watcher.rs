//! Polling watcher for new PDFs under a directory tree.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Whether `path` names a finished PDF (case-insensitive extension)
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// All PDFs below `dir`, recursively, in sorted order.
///
/// A missing directory yields an empty list.
pub fn scan_pdfs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !dir.exists() {
        return Ok(found);
    }

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_dir() && is_pdf(entry.path()) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Reports PDFs that appear between successive polls.
///
/// Files present when the watcher is created are treated as already seen.
#[derive(Debug)]
pub struct DirectoryWatcher {
    root: PathBuf,
    interval: Duration,
    seen: HashSet<PathBuf>,
}

impl DirectoryWatcher {
    pub fn new(root: impl Into<PathBuf>, interval: Duration) -> io::Result<Self> {
        let root = root.into();
        let seen = scan_pdfs(&root)?.into_iter().collect();
        Ok(Self {
            root,
            interval,
            seen,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// PDFs created since the previous poll, sorted
    pub fn poll(&mut self) -> io::Result<Vec<PathBuf>> {
        let current = scan_pdfs(&self.root)?;
        let created: Vec<PathBuf> = current
            .iter()
            .filter(|path| !self.seen.contains(*path))
            .cloned()
            .collect();

        // Deleted files are forgotten so a re-created file is reported again
        self.seen = current.into_iter().collect();
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b.pdf")));
        assert!(is_pdf(Path::new("B.PDF")));
        assert!(!is_pdf(Path::new("b.pdf.part")));
        assert!(!is_pdf(Path::new("b.json")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_scan_is_recursive_and_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nested/deeper")).unwrap();
        fs::write(temp.path().join("b.pdf"), b"").unwrap();
        fs::write(temp.path().join("a.pdf"), b"").unwrap();
        fs::write(temp.path().join("a.json"), b"{}").unwrap();
        fs::write(temp.path().join("nested/deeper/c.PDF"), b"").unwrap();

        let found = scan_pdfs(temp.path()).unwrap();
        assert_eq!(
            found,
            vec![
                temp.path().join("a.pdf"),
                temp.path().join("b.pdf"),
                temp.path().join("nested/deeper/c.PDF"),
            ]
        );

        assert!(scan_pdfs(&temp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_poll_reports_only_new_pdfs() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.pdf"), b"").unwrap();

        let mut watcher = DirectoryWatcher::new(temp.path(), Duration::from_millis(10)).unwrap();
        assert!(watcher.poll().unwrap().is_empty());

        fs::write(temp.path().join("new.pdf"), b"").unwrap();
        fs::write(temp.path().join("partial.pdf.part"), b"").unwrap();
        assert_eq!(watcher.poll().unwrap(), vec![temp.path().join("new.pdf")]);
        assert!(watcher.poll().unwrap().is_empty());

        fs::remove_file(temp.path().join("new.pdf")).unwrap();
        assert!(watcher.poll().unwrap().is_empty());
        fs::write(temp.path().join("new.pdf"), b"").unwrap();
        assert_eq!(watcher.poll().unwrap().len(), 1);
    }
}
