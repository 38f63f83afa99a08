//! Command-line interface.
//!
//! Every flag overrides the matching `PAPERLINK_*` environment setting;
//! flags left unset keep whatever the environment (or a `.env` file)
//! provided.

use std::path::PathBuf;

use clap::Parser;
use paperlink_core::{Settings, SettingsError, WorkerMode, validate_settings};

#[derive(Debug, Parser)]
#[command(name = "paperlink", version, about = "Run the paperlink worker host")]
pub struct Cli {
    /// Run the packaged worker and wait for it to be ready
    #[arg(long)]
    pub production: bool,

    /// Application root (development worker lives under server/)
    #[arg(long, value_name = "DIR")]
    pub app_root: Option<PathBuf>,

    /// Resource directory holding the packaged worker
    #[arg(long, value_name = "DIR")]
    pub resource_dir: Option<PathBuf>,

    /// Interpreter for the development worker
    #[arg(long, value_name = "PATH")]
    pub python: Option<String>,

    /// Worker base URL probed for readiness
    #[arg(long, value_name = "URL")]
    pub worker_url: Option<String>,

    /// Worker log stream URL
    #[arg(long, value_name = "URL")]
    pub log_stream_url: Option<String>,

    /// Give up waiting for the worker after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub readiness_timeout_ms: Option<u64>,

    /// Exit if the worker is not ready in time
    #[arg(long)]
    pub strict_readiness: bool,

    /// Keep at most this many lines per log module
    #[arg(long, value_name = "LINES")]
    pub log_buffer_cap: Option<usize>,

    /// Send a log stream keepalive every N seconds (0 disables)
    #[arg(long, value_name = "SECS", env = "PAPERLINK_KEEPALIVE_SECS", default_value_t = 30)]
    pub keepalive_secs: u64,
}

impl Cli {
    /// Apply flags on top of `settings` and validate the result.
    pub fn apply(&self, mut settings: Settings) -> Result<Settings, SettingsError> {
        if self.production {
            settings.mode = WorkerMode::Production;
        }
        if let Some(dir) = &self.app_root {
            settings.app_root = Some(dir.clone());
        }
        if let Some(dir) = &self.resource_dir {
            settings.resource_dir = Some(dir.clone());
        }
        if let Some(python) = &self.python {
            settings.python = Some(python.clone());
        }
        if let Some(url) = &self.worker_url {
            settings.worker_url.clone_from(url);
        }
        if let Some(url) = &self.log_stream_url {
            settings.log_stream_url.clone_from(url);
        }
        if let Some(ms) = self.readiness_timeout_ms {
            settings.readiness_timeout_ms = ms;
        }
        if self.strict_readiness {
            settings.strict_readiness = true;
        }
        if let Some(cap) = self.log_buffer_cap {
            settings.log_buffer_cap = Some(cap);
        }
        validate_settings(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use paperlink_core::ReadinessPolicy;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "paperlink",
            "--production",
            "--strict-readiness",
            "--readiness-timeout-ms",
            "5000",
            "--log-buffer-cap",
            "200",
        ]);
        let settings = cli.apply(Settings::with_defaults()).unwrap();

        assert_eq!(settings.mode, WorkerMode::Production);
        assert_eq!(settings.readiness_policy(), ReadinessPolicy::Strict);
        assert_eq!(settings.readiness_timeout_ms, 5000);
        assert_eq!(settings.log_buffer_cap, Some(200));
    }

    #[test]
    fn test_unset_flags_keep_settings() {
        let cli = Cli::parse_from(["paperlink"]);
        let mut base = Settings::with_defaults();
        base.mode = WorkerMode::Production;

        let settings = cli.apply(base).unwrap();
        assert_eq!(settings.mode, WorkerMode::Production);
        assert_eq!(cli.keepalive_secs, 30);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["paperlink", "--worker-url", "ftp://nope"]);
        assert!(cli.apply(Settings::with_defaults()).is_err());
    }
}
