//! Worker output sink port.
//!
//! This port abstracts the destination for captured worker stdout/stderr,
//! so the supervisor never decides where the host's diagnostics go.

use crate::domain::WorkerStream;

/// Port for appending captured worker output lines to the host log.
///
/// Implementations should be thread-safe and non-blocking where possible.
pub trait WorkerLogSinkPort: Send + Sync {
    /// Append a line from the worker.
    ///
    /// # Arguments
    ///
    /// * `stream` - Which output stream the line was read from
    /// * `line` - The line content (without trailing newline)
    fn append(&self, stream: WorkerStream, line: String);
}
