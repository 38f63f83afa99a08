//! Host settings domain types and validation.
//!
//! Settings are resolved in three layers: built-in defaults, `PAPERLINK_*`
//! environment variables, then command-line overrides applied by the host.
//! This module only knows the first two.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::WorkerMode;

/// Worker health URL probed before the UI loads.
pub const DEFAULT_WORKER_URL: &str = "http://127.0.0.1:8000";

/// Worker log stream endpoint.
pub const DEFAULT_LOG_STREAM_URL: &str = "ws://127.0.0.1:8000/ws/logs";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 30_000;

/// Delay before the bridge retries a dropped log stream.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

/// Environment variable names.
pub mod env_keys {
    pub const MODE: &str = "PAPERLINK_ENV";
    pub const APP_ROOT: &str = "PAPERLINK_APP_ROOT";
    pub const RESOURCE_DIR: &str = "PAPERLINK_RESOURCE_DIR";
    pub const PYTHON: &str = "PAPERLINK_PYTHON";
    pub const WORKER_URL: &str = "PAPERLINK_WORKER_URL";
    pub const LOG_STREAM_URL: &str = "PAPERLINK_LOG_STREAM_URL";
    pub const READINESS_POLL_MS: &str = "PAPERLINK_READINESS_POLL_MS";
    pub const READINESS_TIMEOUT_MS: &str = "PAPERLINK_READINESS_TIMEOUT_MS";
    pub const STRICT_READINESS: &str = "PAPERLINK_STRICT_READINESS";
    pub const RECONNECT_DELAY_MS: &str = "PAPERLINK_RECONNECT_DELAY_MS";
    pub const LOG_BUFFER_CAP: &str = "PAPERLINK_LOG_BUFFER_CAP";
}

/// What to do when the worker never becomes ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadinessPolicy {
    /// Log a warning and load the UI anyway.
    #[default]
    BestEffort,
    /// Treat the timeout as fatal to startup.
    Strict,
}

/// Immutable readiness probe configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessCheck {
    pub target_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl ReadinessCheck {
    /// Upper bound on probe attempts: `ceil(timeout / poll_interval)`.
    pub fn max_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.timeout.as_millis().div_ceil(interval);
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_WORKER_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_READINESS_TIMEOUT_MS),
        }
    }
}

/// Host settings structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Development or production launch.
    pub mode: WorkerMode,

    /// Root of the application checkout (development worker lookup).
    pub app_root: Option<PathBuf>,

    /// Bundled resources directory (production worker lookup).
    pub resource_dir: Option<PathBuf>,

    /// Interpreter used for the development worker script.
    pub python: Option<String>,

    /// Worker health URL.
    pub worker_url: String,

    /// Worker log stream URL.
    pub log_stream_url: String,

    pub readiness_poll_ms: u64,
    pub readiness_timeout_ms: u64,

    /// Fail startup when the worker never becomes ready.
    pub strict_readiness: bool,

    pub reconnect_delay_ms: u64,

    /// Per-module log buffer cap; `None` keeps every line.
    pub log_buffer_cap: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with built-in defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            mode: WorkerMode::Development,
            app_root: None,
            resource_dir: None,
            python: None,
            worker_url: DEFAULT_WORKER_URL.to_string(),
            log_stream_url: DEFAULT_LOG_STREAM_URL.to_string(),
            readiness_poll_ms: DEFAULT_POLL_INTERVAL_MS,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
            strict_readiness: false,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            log_buffer_cap: None,
        }
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup, layered over defaults.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::with_defaults();

        settings.mode = WorkerMode::from_env_value(get(env_keys::MODE).as_deref());
        settings.app_root = get(env_keys::APP_ROOT).map(PathBuf::from);
        settings.resource_dir = get(env_keys::RESOURCE_DIR).map(PathBuf::from);
        settings.python = get(env_keys::PYTHON);

        if let Some(url) = get(env_keys::WORKER_URL) {
            settings.worker_url = url;
        }
        if let Some(url) = get(env_keys::LOG_STREAM_URL) {
            settings.log_stream_url = url;
        }
        if let Some(raw) = get(env_keys::READINESS_POLL_MS) {
            settings.readiness_poll_ms = parse_number(env_keys::READINESS_POLL_MS, &raw)?;
        }
        if let Some(raw) = get(env_keys::READINESS_TIMEOUT_MS) {
            settings.readiness_timeout_ms = parse_number(env_keys::READINESS_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(env_keys::STRICT_READINESS) {
            settings.strict_readiness = parse_flag(env_keys::STRICT_READINESS, &raw)?;
        }
        if let Some(raw) = get(env_keys::RECONNECT_DELAY_MS) {
            settings.reconnect_delay_ms = parse_number(env_keys::RECONNECT_DELAY_MS, &raw)?;
        }
        if let Some(raw) = get(env_keys::LOG_BUFFER_CAP) {
            settings.log_buffer_cap = Some(parse_number(env_keys::LOG_BUFFER_CAP, &raw)?);
        }

        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn readiness_check(&self) -> ReadinessCheck {
        ReadinessCheck {
            target_url: self.worker_url.clone(),
            poll_interval: Duration::from_millis(self.readiness_poll_ms),
            timeout: Duration::from_millis(self.readiness_timeout_ms),
        }
    }

    pub const fn readiness_policy(&self) -> ReadinessPolicy {
        if self.strict_readiness {
            ReadinessPolicy::Strict
        } else {
            ReadinessPolicy::BestEffort
        }
    }

    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Errors that can occur during settings resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("{key} must be true/false, got {value:?}")]
    InvalidFlag { key: String, value: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SettingsError> {
    raw.trim()
        .parse()
        .map_err(|_| SettingsError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, SettingsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidFlag {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Validate a fully resolved settings value.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.readiness_poll_ms == 0 {
        return Err(SettingsError::Invalid {
            field: "readiness_poll_ms",
            reason: "must be greater than zero".to_string(),
        });
    }
    if settings.readiness_timeout_ms == 0 {
        return Err(SettingsError::Invalid {
            field: "readiness_timeout_ms",
            reason: "must be greater than zero".to_string(),
        });
    }
    if settings.readiness_poll_ms > settings.readiness_timeout_ms {
        return Err(SettingsError::Invalid {
            field: "readiness_poll_ms",
            reason: format!(
                "poll interval {}ms exceeds timeout {}ms",
                settings.readiness_poll_ms, settings.readiness_timeout_ms
            ),
        });
    }
    if settings.reconnect_delay_ms == 0 {
        return Err(SettingsError::Invalid {
            field: "reconnect_delay_ms",
            reason: "must be greater than zero".to_string(),
        });
    }
    if settings.log_buffer_cap == Some(0) {
        return Err(SettingsError::Invalid {
            field: "log_buffer_cap",
            reason: "must be greater than zero when set".to_string(),
        });
    }
    if !has_scheme(&settings.worker_url, &["http://", "https://"]) {
        return Err(SettingsError::Invalid {
            field: "worker_url",
            reason: format!("expected an http(s) URL, got {}", settings.worker_url),
        });
    }
    if !has_scheme(&settings.log_stream_url, &["ws://", "wss://"]) {
        return Err(SettingsError::Invalid {
            field: "log_stream_url",
            reason: format!("expected a ws(s) URL, got {}", settings.log_stream_url),
        });
    }
    Ok(())
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    let lower = url.to_ascii_lowercase();
    schemes
        .iter()
        .any(|s| lower.starts_with(s) && lower.len() > s.len())
}
