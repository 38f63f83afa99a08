//! Destination for decoded log stream events.

use crate::domain::{AnalyzeProgress, LogEvent};

/// Receives events decoded by the log stream bridge, in arrival order.
///
/// The sink never sees connection state and cannot influence it.
pub trait LogEventSink: Send + Sync {
    /// Deliver one log line.
    fn deliver(&self, event: LogEvent);

    /// Deliver an analysis progress update.
    fn progress(&self, update: AnalyzeProgress);
}

/// Sink that discards everything. Useful for tests and headless probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogEventSink;

impl LogEventSink for NoopLogEventSink {
    fn deliver(&self, _event: LogEvent) {}
    fn progress(&self, _update: AnalyzeProgress) {}
}
