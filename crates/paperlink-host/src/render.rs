//! Console rendering of log store updates.

use paperlink_runtime::StoreUpdate;

/// One console line for `update`, or `None` if it has no visible form.
pub fn render_update(update: &StoreUpdate) -> Option<String> {
    match update {
        StoreUpdate::Appended {
            module, message, ..
        } => Some(format!("[{module}] {message}")),
        StoreUpdate::Progress(p) => {
            let file = p.current_file.as_deref().unwrap_or("-");
            let step = p.current_step.as_deref().unwrap_or("");
            Some(format!(
                "[progress] {}/{} {file} {step} {:.0}%",
                p.current_file_index, p.total_files, p.progress
            ))
        }
        StoreUpdate::Cleared { .. } | StoreUpdate::ProgressCleared => None,
    }
}
