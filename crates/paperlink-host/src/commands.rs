//! Host command handlers.
//!
//! Each [`HostRequest`] maps to one typed handler. Handlers are thin: they
//! validate input, call the dialog port, the scanner or the log store, and
//! map errors to [`HostError`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use paperlink_core::{DialogPort, FileEntry, HostRequest, HostResponse, PickOptions};
use paperlink_runtime::{LogStore, expand_selection, scan_documents};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::HostError;

/// Dialogs for a host without a window: every picker is cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessDialogs;

#[async_trait]
impl DialogPort for HeadlessDialogs {
    async fn pick_paths(&self, _options: PickOptions) -> Vec<PathBuf> {
        info!("No UI attached, file picker cancelled");
        Vec::new()
    }

    async fn pick_directory(&self) -> Option<PathBuf> {
        info!("No UI attached, directory picker cancelled");
        None
    }
}

/// Routes UI requests to their handlers.
#[derive(Clone)]
pub struct CommandDispatcher {
    dialogs: Arc<dyn DialogPort>,
    store: Arc<LogStore>,
    /// Cancels scans in flight at shutdown.
    cancel: CancellationToken,
}

impl CommandDispatcher {
    pub fn new(
        dialogs: Arc<dyn DialogPort>,
        store: Arc<LogStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            dialogs,
            store,
            cancel,
        }
    }

    pub async fn handle(&self, request: HostRequest) -> Result<HostResponse, HostError> {
        debug!(command = request.name(), "Handling host request");
        match request {
            HostRequest::SelectFiles => self.select_files().await.map(HostResponse::Files),
            HostRequest::SelectDirectory => {
                Ok(HostResponse::Directory(self.dialogs.pick_directory().await))
            }
            HostRequest::ScanDirectory { path } => {
                self.scan_directory(path).await.map(HostResponse::Files)
            }
            HostRequest::IsDirectory { path } => Ok(HostResponse::Bool(is_directory(&path).await)),
            HostRequest::OpenExternal { url } => {
                open_external(&url)?;
                Ok(HostResponse::Done)
            }
            HostRequest::GetLogs { module } => Ok(HostResponse::Logs(self.store.snapshot(module))),
            HostRequest::ClearLogs { module } => {
                self.store.clear(module);
                info!(%module, "Cleared log panel");
                Ok(HostResponse::Done)
            }
            HostRequest::ClearProgress => {
                self.store.clear_progress();
                Ok(HostResponse::Done)
            }
        }
    }

    /// Handle a JSON-encoded request and return a JSON-encoded result.
    ///
    /// The output is `{"ok": <response>}` or `{"err": <error>}`.
    pub async fn handle_json(&self, raw: &str) -> String {
        let result = match serde_json::from_str::<HostRequest>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => Err(HostError::InvalidInput(e.to_string())),
        };
        let value = match result {
            Ok(response) => serde_json::json!({ "ok": response }),
            Err(err) => serde_json::json!({ "err": err }),
        };
        value.to_string()
    }

    async fn select_files(&self) -> Result<Vec<FileEntry>, HostError> {
        let picked = self.dialogs.pick_paths(PickOptions::documents()).await;
        if picked.is_empty() {
            return Ok(Vec::new());
        }
        Ok(expand_selection(picked, &self.cancel).await)
    }

    async fn scan_directory(&self, path: PathBuf) -> Result<Vec<FileEntry>, HostError> {
        let entries = scan_documents(path.clone(), self.cancel.clone())
            .collect()
            .await?;
        info!(path = %path.display(), count = entries.len(), "Scanned directory");
        Ok(entries)
    }
}

async fn is_directory(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_dir())
}

/// Only http(s) links leave the app.
fn open_external(url: &str) -> Result<(), HostError> {
    let lower = url.trim().to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(HostError::InvalidInput(format!(
            "Refusing to open non-http URL: {url}"
        )));
    }
    open::that(url.trim()).map_err(|e| HostError::Internal(format!("Failed to open {url}: {e}")))?;
    info!(%url, "Opened external link");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlink_core::{AnalyzeProgress, LogModule};
    use std::fs;
    use tempfile::TempDir;

    /// Dialogs that return a fixed selection.
    struct FixedDialogs(Vec<PathBuf>);

    #[async_trait]
    impl DialogPort for FixedDialogs {
        async fn pick_paths(&self, options: PickOptions) -> Vec<PathBuf> {
            assert_eq!(options, PickOptions::documents());
            self.0.clone()
        }

        async fn pick_directory(&self) -> Option<PathBuf> {
            self.0.first().cloned()
        }
    }

    fn dispatcher(dialogs: impl DialogPort + 'static) -> CommandDispatcher {
        CommandDispatcher::new(
            Arc::new(dialogs),
            Arc::new(LogStore::default()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_select_files_expands_folders() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("batch")).unwrap();
        fs::write(dir.path().join("batch/one.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("two.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        let d = dispatcher(FixedDialogs(vec![
            dir.path().join("batch"),
            dir.path().join("two.pdf"),
            dir.path().join("readme.md"),
        ]));

        let HostResponse::Files(files) = d.handle(HostRequest::SelectFiles).await.unwrap() else {
            panic!("expected files");
        };
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["one.pdf", "two.pdf"]);
    }

    #[tokio::test]
    async fn test_headless_pickers_cancel() {
        let d = dispatcher(HeadlessDialogs);
        assert_eq!(
            d.handle(HostRequest::SelectFiles).await.unwrap(),
            HostResponse::Files(Vec::new())
        );
        assert_eq!(
            d.handle(HostRequest::SelectDirectory).await.unwrap(),
            HostResponse::Directory(None)
        );
    }

    #[tokio::test]
    async fn test_is_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.pdf");
        fs::write(&file, b"%PDF").unwrap();
        let d = dispatcher(HeadlessDialogs);

        let yes = d
            .handle(HostRequest::IsDirectory {
                path: dir.path().to_path_buf(),
            })
            .await
            .unwrap();
        let no = d.handle(HostRequest::IsDirectory { path: file }).await.unwrap();
        assert_eq!(yes, HostResponse::Bool(true));
        assert_eq!(no, HostResponse::Bool(false));
    }

    #[tokio::test]
    async fn test_scan_missing_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(HeadlessDialogs);
        let err = d
            .handle(HostRequest::ScanDirectory {
                path: dir.path().join("missing"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_external_rejects_other_schemes() {
        let d = dispatcher(HeadlessDialogs);
        for url in ["file:///etc/passwd", "javascript:alert(1)", "ftp://example.com"] {
            let err = d
                .handle(HostRequest::OpenExternal {
                    url: url.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, HostError::InvalidInput(_)), "{url}");
        }
    }

    #[tokio::test]
    async fn test_clear_logs_empties_one_module() {
        let store = Arc::new(LogStore::default());
        store.append(LogModule::Analyze, "parsing a.pdf");
        store.append(LogModule::Env, "python 3.12");
        let d = CommandDispatcher::new(
            Arc::new(HeadlessDialogs),
            store.clone(),
            CancellationToken::new(),
        );

        let done = d
            .handle(HostRequest::ClearLogs {
                module: LogModule::Analyze,
            })
            .await
            .unwrap();
        assert_eq!(done, HostResponse::Done);
        assert!(store.is_empty(LogModule::Analyze));

        let env = d
            .handle(HostRequest::GetLogs {
                module: LogModule::Env,
            })
            .await
            .unwrap();
        assert_eq!(env, HostResponse::Logs(vec!["python 3.12".to_string()]));
    }

    #[tokio::test]
    async fn test_clear_progress() {
        let store = Arc::new(LogStore::default());
        store.set_progress(AnalyzeProgress::default());
        let d = CommandDispatcher::new(
            Arc::new(HeadlessDialogs),
            store.clone(),
            CancellationToken::new(),
        );

        d.handle(HostRequest::ClearProgress).await.unwrap();
        assert!(store.progress().is_none());
    }

    #[tokio::test]
    async fn test_handle_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(HeadlessDialogs);
        let raw = serde_json::json!({"command": "isDirectory", "path": dir.path()}).to_string();

        let out: serde_json::Value = serde_json::from_str(&d.handle_json(&raw).await).unwrap();
        assert_eq!(out["ok"]["type"], "bool");
        assert_eq!(out["ok"]["value"], true);

        let out: serde_json::Value =
            serde_json::from_str(&d.handle_json(r#"{"command":"format"}"#).await).unwrap();
        assert_eq!(out["err"]["type"], "InvalidInput");
    }
}
