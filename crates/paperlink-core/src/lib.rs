//! Core domain types and port definitions for the paperlink host.
//!
//! This crate describes the coordination layer between the desktop host and
//! the out-of-process extraction worker without implementing any process,
//! network or filesystem behaviour. Implementations live in
//! `paperlink-runtime`; wiring lives in `paperlink-host`.
#![deny(unused_crate_dependencies)]

pub mod commands;
pub mod domain;
pub mod errors;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use commands::{HostRequest, HostResponse};
pub use domain::{
    AnalyzeProgress, ConnectionState, FileEntry, InboundFrame, LogEvent, LogModule, WorkerMode,
    WorkerInvocation, WorkerStatus, WorkerStream,
};
pub use errors::{MalformedMessage, ReadinessTimeout, SpawnError, TransportError};
pub use paths::{PathError, data_root, resolve_worker_invocation};
pub use ports::{
    DialogPort, HealthProbe, LogConnection, LogEventSink, LogTransport, NoopLogEventSink,
    PickOptions, WorkerLogSinkPort,
};
pub use settings::{
    DEFAULT_LOG_STREAM_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_READINESS_TIMEOUT_MS,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_WORKER_URL, ReadinessCheck, ReadinessPolicy, Settings,
    SettingsError, validate_settings,
};
