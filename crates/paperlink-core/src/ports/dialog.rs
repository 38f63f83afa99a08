//! Native file dialog port.
//!
//! Dialog rendering belongs to the UI toolkit; the host only needs the
//! selected paths back.

use std::path::PathBuf;

use async_trait::async_trait;

/// What a file picker should allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOptions {
    /// Allow picking directories as well as files.
    pub directories: bool,
    pub multiple: bool,
    /// Extensions offered by the filter, without dots.
    pub extensions: Vec<String>,
}

impl PickOptions {
    /// Files or folders, many at once, filtered to PDFs.
    pub fn documents() -> Self {
        Self {
            directories: true,
            multiple: true,
            extensions: vec!["pdf".to_string()],
        }
    }
}

#[async_trait]
pub trait DialogPort: Send + Sync {
    /// Show a picker. An empty result means the user cancelled.
    async fn pick_paths(&self, options: PickOptions) -> Vec<PathBuf>;

    /// Show a directory picker. `None` means the user cancelled.
    async fn pick_directory(&self) -> Option<PathBuf>;
}
