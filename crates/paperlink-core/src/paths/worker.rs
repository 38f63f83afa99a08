//! Worker invocation resolution.

use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{app_root, resource_root};
use crate::domain::{WorkerInvocation, WorkerMode};
use crate::settings::Settings;

/// Development worker script, relative to the application root.
pub const DEV_WORKER_SCRIPT: &str = "server/run.py";

/// Packaged worker executable name without platform suffix.
pub const WORKER_EXECUTABLE_STEM: &str = "paper-server";

/// Packaged worker file name for the current platform.
pub fn worker_executable_name() -> String {
    format!("{WORKER_EXECUTABLE_STEM}{}", std::env::consts::EXE_SUFFIX)
}

/// Interpreter used when `PAPERLINK_PYTHON` is not set.
pub const fn default_interpreter() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Resolve how the worker should be launched for the configured mode.
///
/// The working directory is always the folder containing the worker entry
/// point, so relative paths inside the worker resolve the same way in both
/// modes.
pub fn resolve_worker_invocation(settings: &Settings) -> Result<WorkerInvocation, PathError> {
    match settings.mode {
        WorkerMode::Development => {
            let script = app_root(settings.app_root.as_ref())?.join(DEV_WORKER_SCRIPT);
            let interpreter = settings
                .python
                .clone()
                .unwrap_or_else(|| default_interpreter().to_string());
            Ok(WorkerInvocation {
                program: PathBuf::from(interpreter),
                working_dir: parent_dir(&script),
                script: Some(script),
                mode: WorkerMode::Development,
            })
        }
        WorkerMode::Production => {
            let program = resource_root(settings.resource_dir.as_ref())?
                .join("server")
                .join(worker_executable_name());
            Ok(WorkerInvocation {
                working_dir: parent_dir(&program),
                program,
                script: None,
                mode: WorkerMode::Production,
            })
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
