//! Recursive PDF discovery.
//!
//! The walk runs on the blocking pool and streams entries back over a
//! channel. It keeps an explicit worklist and a set of canonical directory
//! paths, so symlink loops end the branch instead of the scan, and it
//! checks a cancellation token between directories.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use paperlink_core::FileEntry;
use paperlink_core::domain::is_pdf;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Entries buffered between the walker and the consumer.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The starting path could not be read.
    #[error("Cannot scan {}: {reason}", path.display())]
    Root { path: PathBuf, reason: String },

    #[error("Scan task failed: {0}")]
    Join(String),
}

/// How a finished scan went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files: usize,
    pub directories: usize,
    /// Subdirectories skipped because they could not be read.
    pub skipped: usize,
    pub cancelled: bool,
}

/// A running scan.
pub struct ScanStream {
    rx: mpsc::Receiver<FileEntry>,
    task: JoinHandle<Result<ScanSummary, ScanError>>,
}

impl ScanStream {
    /// Next entry, or `None` once the walk is over.
    pub async fn next(&mut self) -> Option<FileEntry> {
        self.rx.recv().await
    }

    /// Wait for the walk to end and return its summary.
    pub async fn finish(self) -> Result<ScanSummary, ScanError> {
        drop(self.rx);
        self.task.await.map_err(|e| ScanError::Join(e.to_string()))?
    }

    /// Drain every entry.
    pub async fn collect(mut self) -> Result<Vec<FileEntry>, ScanError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.rx.recv().await {
            entries.push(entry);
        }
        self.finish().await?;
        Ok(entries)
    }
}

/// Start scanning `root` for PDF files.
///
/// A file root yields itself if it is a PDF. Unreadable subdirectories are
/// logged and skipped; an unreadable root fails the scan. Must be called
/// from within a Tokio runtime.
pub fn scan_documents(root: PathBuf, cancel: CancellationToken) -> ScanStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::task::spawn_blocking(move || walk(&root, &tx, &cancel));
    ScanStream { rx, task }
}

/// Expand picked paths into PDF entries.
///
/// Directories are scanned recursively, PDF files are taken as is, and
/// anything else is ignored. A path that fails to scan is logged and
/// skipped.
pub async fn expand_selection(paths: Vec<PathBuf>, cancel: &CancellationToken) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    for path in paths {
        if cancel.is_cancelled() {
            break;
        }
        match scan_documents(path.clone(), cancel.clone()).collect().await {
            Ok(found) => entries.extend(found),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable selection"),
        }
    }
    entries
}

fn walk(
    root: &Path,
    tx: &mpsc::Sender<FileEntry>,
    cancel: &CancellationToken,
) -> Result<ScanSummary, ScanError> {
    let root_error = |e: std::io::Error| ScanError::Root {
        path: root.to_path_buf(),
        reason: e.to_string(),
    };

    let mut summary = ScanSummary::default();
    let meta = fs::metadata(root).map_err(root_error)?;
    if meta.is_file() {
        let entry = FileEntry::new(root.to_path_buf(), meta.len());
        if is_pdf(root) && tx.blocking_send(entry).is_ok() {
            summary.files = 1;
        }
        return Ok(summary);
    }

    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut worklist: VecDeque<PathBuf> = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = worklist.pop_front() {
        if cancel.is_cancelled() {
            debug!(root = %root.display(), "Scan cancelled");
            summary.cancelled = true;
            break;
        }

        let canonical = match fs::canonicalize(&dir) {
            Ok(path) => path,
            Err(e) if dir == root => return Err(root_error(e)),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unresolvable directory");
                summary.skipped += 1;
                continue;
            }
        };
        if !visited.insert(canonical) {
            debug!(path = %dir.display(), "Directory already visited");
            continue;
        }

        let reader = match fs::read_dir(&dir) {
            Ok(reader) => reader,
            Err(e) if dir == root => return Err(root_error(e)),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                summary.skipped += 1;
                continue;
            }
        };
        summary.directories += 1;

        let mut children: Vec<PathBuf> = reader.filter_map(Result::ok).map(|e| e.path()).collect();
        children.sort();

        for path in children {
            // Follows symlinks; loops are caught by `visited`
            let Ok(meta) = fs::metadata(&path) else {
                debug!(path = %path.display(), "Skipping dangling entry");
                continue;
            };
            if meta.is_dir() {
                worklist.push_back(path);
            } else if meta.is_file() && is_pdf(&path) {
                if tx.blocking_send(FileEntry::new(path, meta.len())).is_err() {
                    // Consumer went away
                    return Ok(summary);
                }
                summary.files += 1;
            }
        }
    }

    Ok(summary)
}
