//! Typed request/response protocol between the UI and the host.
//!
//! Every call the UI can make into the host is a variant here; there are no
//! string-keyed handlers. The serde shape produces JSON like
//! `{"command": "scanDirectory", "path": "/docs"}`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{FileEntry, LogModule};

/// A request from the UI to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostRequest {
    /// Pick PDF files and/or folders; folders are expanded recursively.
    SelectFiles,
    /// Pick a single output directory.
    SelectDirectory,
    /// List every PDF under a directory (used for dropped folders).
    ScanDirectory { path: PathBuf },
    /// Whether a path is an existing directory.
    IsDirectory { path: PathBuf },
    /// Open an http(s) link in the system browser.
    OpenExternal { url: String },
    /// Lines currently held for one log panel, oldest first.
    GetLogs { module: LogModule },
    /// Empty one log panel.
    ClearLogs { module: LogModule },
    /// Forget the last analysis progress.
    ClearProgress,
}

impl HostRequest {
    /// Short name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectFiles => "selectFiles",
            Self::SelectDirectory => "selectDirectory",
            Self::ScanDirectory { .. } => "scanDirectory",
            Self::IsDirectory { .. } => "isDirectory",
            Self::OpenExternal { .. } => "openExternal",
            Self::GetLogs { .. } => "getLogs",
            Self::ClearLogs { .. } => "clearLogs",
            Self::ClearProgress => "clearProgress",
        }
    }
}

/// The host's answer to a [`HostRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostResponse {
    Files(Vec<FileEntry>),
    Directory(Option<PathBuf>),
    Bool(bool),
    Logs(Vec<String>),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_string(&HostRequest::ScanDirectory {
            path: PathBuf::from("/docs"),
        })
        .unwrap();
        assert_eq!(json, r#"{"command":"scanDirectory","path":"/docs"}"#);

        let parsed: HostRequest = serde_json::from_str(r#"{"command":"selectFiles"}"#).unwrap();
        assert_eq!(parsed, HostRequest::SelectFiles);
    }

    #[test]
    fn test_log_request_wire_shape() {
        let parsed: HostRequest =
            serde_json::from_str(r#"{"command":"clearLogs","module":"config"}"#).unwrap();
        assert_eq!(
            parsed,
            HostRequest::ClearLogs {
                module: LogModule::Config
            }
        );
        assert!(
            serde_json::from_str::<HostRequest>(r#"{"command":"getLogs","module":"kernel"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(serde_json::from_str::<HostRequest>(r#"{"command":"rmRf"}"#).is_err());
    }

    #[test]
    fn test_response_wire_shape() {
        let json = serde_json::to_string(&HostResponse::Bool(true)).unwrap();
        assert_eq!(json, r#"{"type":"bool","value":true}"#);
        let json = serde_json::to_string(&HostResponse::Done).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);
    }
}
