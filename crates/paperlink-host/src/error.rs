//! Host error types and mappings.
//!
//! `HostError` is what the UI sees for a failed [`HostRequest`]. The
//! `#[serde(tag = "type", content = "message")]` attribute produces JSON
//! like `{"type": "NotFound", "message": "/docs"}`.
//!
//! [`HostRequest`]: paperlink_core::HostRequest

use paperlink_core::{ReadinessTimeout, SettingsError, SpawnError};
use paperlink_runtime::{ScanError, SupervisorError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum HostError {
    /// Path or resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input from the UI.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Worker launch or termination failure.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The worker never became ready under a strict policy.
    #[error("Worker not ready: {0}")]
    NotReady(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SpawnError> for HostError {
    fn from(err: SpawnError) -> Self {
        match err {
            SpawnError::NotFound(path) | SpawnError::MissingWorkingDir(path) => {
                Self::NotFound(path.display().to_string())
            }
            other => Self::Worker(other.to_string()),
        }
    }
}

impl From<SupervisorError> for HostError {
    fn from(err: SupervisorError) -> Self {
        Self::Worker(err.to_string())
    }
}

impl From<ReadinessTimeout> for HostError {
    fn from(err: ReadinessTimeout) -> Self {
        Self::NotReady(err.to_string())
    }
}

impl From<ScanError> for HostError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Root { path, reason } => {
                Self::NotFound(format!("{}: {reason}", path.display()))
            }
            ScanError::Join(msg) => Self::Internal(msg),
        }
    }
}

impl From<SettingsError> for HostError {
    fn from(err: SettingsError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_error_serialization() {
        let err = HostError::InvalidInput("file:///etc/passwd".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "InvalidInput");
        assert_eq!(json["message"], "file:///etc/passwd");
    }

    #[test]
    fn test_spawn_error_conversion() {
        let err: HostError = SpawnError::NotFound(PathBuf::from("/app/server/run.py")).into();
        assert!(matches!(err, HostError::NotFound(_)));

        let err: HostError = SpawnError::AlreadyLaunched(Some(7)).into();
        assert!(matches!(err, HostError::Worker(_)));
    }

    #[test]
    fn test_readiness_conversion() {
        let err: HostError = ReadinessTimeout {
            target_url: "http://127.0.0.1:8000".to_string(),
            attempts: 60,
            elapsed: Duration::from_secs(30),
        }
        .into();
        assert!(matches!(err, HostError::NotReady(_)));
    }
}
