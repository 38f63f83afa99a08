//! Domain types for the worker coordination layer.
//!
//! These are pure data types with no infrastructure dependencies.

mod connection;
mod files;
mod log;
mod worker;

pub use connection::ConnectionState;
pub use files::{FileEntry, is_pdf};
pub use log::{AnalyzeProgress, InboundFrame, LogEvent, LogModule, PONG_PAYLOAD, PING_PAYLOAD};
pub use worker::{WorkerInvocation, WorkerMode, WorkerStatus, WorkerStream};
