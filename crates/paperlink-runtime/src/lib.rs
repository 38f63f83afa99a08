//! Process runtime and OS-level concerns for paperlink.
//!
//! - [`supervisor`] owns the worker process
//! - [`readiness`] waits for the worker to answer HTTP
//! - [`bridge`] keeps the worker log stream connected
//! - [`logs`] stores decoded log lines per module for the UI
//! - [`scan`] finds documents on disk without blocking the executor
#![deny(unsafe_code)]

pub mod bridge;
mod health;
pub mod logs;
pub mod readiness;
pub mod scan;
pub mod supervisor;

// Re-export the main entry points
pub use bridge::{BridgeConfig, BridgeStats, LogStreamBridge, WsTransport};
pub use health::HttpHealthProbe;
pub use logs::{LogStore, StoreUpdate};
pub use readiness::{ReadinessOutcome, ReadinessProber, ReadyReport};
pub use scan::{ScanError, ScanStream, ScanSummary, expand_selection, scan_documents};
pub use supervisor::{
    NoopLogSink, SupervisorError, TerminateOutcome, TracingLogSink, WorkerSupervisor,
};
