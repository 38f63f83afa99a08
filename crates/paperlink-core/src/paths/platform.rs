//! Platform-specific directory detection.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

const APP_DIR_NAME: &str = "paperlink";

/// Root of the application checkout.
///
/// An explicit override wins; otherwise the current directory is used,
/// matching how the development worker is launched from a source tree.
pub fn app_root(override_path: Option<&PathBuf>) -> Result<PathBuf, PathError> {
    if let Some(path) = override_path {
        return Ok(path.clone());
    }
    env::current_dir().map_err(|e| PathError::CurrentDirError(e.to_string()))
}

/// Bundled resources directory of a packaged build.
///
/// Resolution order:
/// 1. Explicit override
/// 2. macOS bundles: `<exe_dir>/../Resources`
/// 3. Everywhere else: `<exe_dir>/resources`
pub fn resource_root(override_path: Option<&PathBuf>) -> Result<PathBuf, PathError> {
    if let Some(path) = override_path {
        return Ok(path.clone());
    }

    let exe = env::current_exe().map_err(|e| PathError::CurrentExeError(e.to_string()))?;
    let exe_dir = exe
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| PathError::CurrentExeError(format!("{} has no parent", exe.display())))?;

    if cfg!(target_os = "macos") {
        let bundled = exe_dir.join("..").join("Resources");
        if bundled.exists() {
            return Ok(bundled);
        }
    }

    Ok(exe_dir.join("resources"))
}

/// Per-user data directory for the host.
pub fn data_root() -> Result<PathBuf, PathError> {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(PathError::NoDataDir)
}

/// Directory for the host's rotating log files.
pub fn log_dir() -> Result<PathBuf, PathError> {
    data_root().map(|root| root.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let custom = PathBuf::from("/tmp/paperlink-root");
        assert_eq!(app_root(Some(&custom)).unwrap(), custom);
        assert_eq!(resource_root(Some(&custom)).unwrap(), custom);
    }

    #[test]
    fn test_resource_root_defaults_next_to_exe() {
        let root = resource_root(None).unwrap();
        let exe_dir = env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert!(root.starts_with(&exe_dir));
    }

    #[test]
    fn test_log_dir_under_data_root() {
        if let (Ok(root), Ok(logs)) = (data_root(), log_dir()) {
            assert!(logs.starts_with(root));
        }
    }
}
