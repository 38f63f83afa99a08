//! Worker output sinks.

use paperlink_core::{WorkerLogSinkPort, WorkerStream};
use tracing::{info, warn};

/// Forwards worker output into the host's tracing log.
///
/// Stdout lines are logged at `info` with a `[SERVER]` prefix, stderr lines
/// at `warn` with `[SERVER ERROR]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl WorkerLogSinkPort for TracingLogSink {
    fn append(&self, stream: WorkerStream, line: String) {
        match stream {
            WorkerStream::Stdout => info!(target: "paperlink::worker", "{} {}", stream.tag(), line),
            WorkerStream::Stderr => warn!(target: "paperlink::worker", "{} {}", stream.tag(), line),
        }
    }
}

/// Discards worker output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl WorkerLogSinkPort for NoopLogSink {
    fn append(&self, _stream: WorkerStream, _line: String) {}
}
