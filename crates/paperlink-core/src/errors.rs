//! Error taxonomy for the worker coordination layer.
//!
//! None of these abort the host on their own; adapters decide how each one
//! is surfaced (logged, retried, or escalated).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Longest payload excerpt kept in a [`MalformedMessage`].
const PREVIEW_LIMIT: usize = 120;

/// The worker could not be launched. Fatal to that launch attempt; never
/// retried automatically.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The worker script or executable does not exist.
    #[error("Worker entry point not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The working directory does not exist.
    #[error("Worker directory not found: {}", .0.display())]
    MissingWorkingDir(PathBuf),

    /// The OS refused to create the process.
    #[error("Failed to spawn worker {program}: {reason}")]
    Os { program: String, reason: String },

    /// A worker was already launched during this application lifetime.
    #[error("Worker was already launched (pid {0:?})")]
    AlreadyLaunched(Option<u32>),
}

/// The worker did not answer the readiness probe in time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Worker at {target_url} not ready after {attempts} attempts ({elapsed:?})")]
pub struct ReadinessTimeout {
    pub target_url: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Log stream transport failure. Always handled by the reconnect path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Log stream read failed: {0}")]
    Read(String),

    #[error("Log stream write failed: {0}")]
    Write(String),

    /// A frame arrived that is not text. The connection stays usable.
    #[error("Undecodable log frame: {0}")]
    Undecodable(MalformedMessage),
}

/// A single inbound frame that could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Malformed log frame ({reason}): {payload_preview}")]
pub struct MalformedMessage {
    /// Leading part of the offending payload.
    pub payload_preview: String,
    pub reason: String,
}

impl MalformedMessage {
    pub fn new(payload: &str, reason: impl Into<String>) -> Self {
        let payload_preview = match payload.char_indices().nth(PREVIEW_LIMIT) {
            Some((idx, _)) => format!("{}…", &payload[..idx]),
            None => payload.to_string(),
        };
        Self {
            payload_preview,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_preview_truncates() {
        let long = "x".repeat(500);
        let err = MalformedMessage::new(&long, "bad");
        assert_eq!(err.payload_preview.chars().count(), PREVIEW_LIMIT + 1);
        assert!(err.payload_preview.ends_with('…'));
    }

    #[test]
    fn test_malformed_preview_multibyte() {
        let payload = "日志".repeat(100);
        let err = MalformedMessage::new(&payload, "bad");
        assert!(err.payload_preview.starts_with("日志"));
    }

    #[test]
    fn test_readiness_timeout_display() {
        let err = ReadinessTimeout {
            target_url: "http://127.0.0.1:8000".to_string(),
            attempts: 60,
            elapsed: Duration::from_secs(30),
        };
        let msg = err.to_string();
        assert!(msg.contains("60 attempts"));
        assert!(msg.contains("127.0.0.1:8000"));
    }
}
