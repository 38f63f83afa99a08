//! Worker process domain types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the worker is launched.
///
/// Development runs the worker script through an interpreter and lets it
/// inherit the host console; production runs the packaged executable with
/// its output captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    #[default]
    Development,
    Production,
}

impl WorkerMode {
    /// Interpret an environment value. Only `production` selects production mode.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Whether worker stdout/stderr are captured into the host log sink.
    pub const fn captures_output(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether UI startup waits for the readiness probe.
    pub const fn gates_on_readiness(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Lifecycle status of the worker process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "code", rename_all = "camelCase")]
pub enum WorkerStatus {
    #[default]
    NotStarted,
    Starting,
    Running,
    /// Exit code is `None` when the process was ended by a signal.
    Exited(Option<i32>),
}

impl WorkerStatus {
    /// Whether a live process handle may still exist.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Exited(Some(code)) => write!(f, "exited with code {code}"),
            Self::Exited(None) => write!(f, "exited by signal"),
        }
    }
}

/// Which captured output stream a worker line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStream {
    Stdout,
    Stderr,
}

impl WorkerStream {
    /// Prefix attached to forwarded lines in the host log.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Stdout => "[SERVER]",
            Self::Stderr => "[SERVER ERROR]",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Fully resolved command line for launching the worker.
///
/// `script` is only set in development mode, where `program` is the
/// interpreter. No other arguments are ever passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    /// Executable to run (interpreter or packaged worker binary).
    pub program: PathBuf,
    /// Script handed to the interpreter.
    pub script: Option<PathBuf>,
    /// Working directory: the folder containing the worker.
    pub working_dir: PathBuf,
    /// Mode the invocation was resolved for.
    pub mode: WorkerMode,
}

impl WorkerInvocation {
    /// Path that must exist for the launch to succeed.
    ///
    /// In development mode this is the script (the interpreter is looked up
    /// on `PATH` by the OS); in production mode the executable itself.
    pub fn entry_point(&self) -> &PathBuf {
        self.script.as_ref().unwrap_or(&self.program)
    }
}
