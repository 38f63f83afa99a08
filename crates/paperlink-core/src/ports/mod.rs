//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the coordination layer expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `tokio::process`, `reqwest` or websocket types in any signature
//! - Sinks are fire-and-forget: adapters handle their own failures
//! - Async ports use `async_trait` so they stay object-safe behind `Arc<dyn _>`

pub mod dialog;
pub mod health_probe;
pub mod log_event_sink;
pub mod log_transport;
pub mod worker_log_sink;

pub use dialog::{DialogPort, PickOptions};
pub use health_probe::HealthProbe;
pub use log_event_sink::{LogEventSink, NoopLogEventSink};
pub use log_transport::{LogConnection, LogTransport};
pub use worker_log_sink::WorkerLogSinkPort;
