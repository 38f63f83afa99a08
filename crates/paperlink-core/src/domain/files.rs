//! Document selection types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A document the user selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name without directory.
    pub name: String,
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path, size }
    }
}

/// Whether a path names a PDF document (case-insensitive extension check).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("/docs/paper.pdf")));
        assert!(is_pdf(Path::new("/docs/PAPER.PDF")));
        assert!(!is_pdf(Path::new("/docs/paper.pdf.txt")));
        assert!(!is_pdf(Path::new("/docs/pdf")));
    }

    #[test]
    fn test_entry_name_from_path() {
        let entry = FileEntry::new(PathBuf::from("/docs/sub/a.pdf"), 42);
        assert_eq!(entry.name, "a.pdf");
        assert_eq!(entry.size, 42);
    }
}
