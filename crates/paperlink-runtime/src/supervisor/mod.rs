//! Worker process supervision.
//!
//! - [`core`]: launch, exit watching and the single termination request
//! - `stream`: lossy line readers for captured output
//! - `signal`: the platform termination request
//! - [`sink`]: where captured output goes

mod core;
mod signal;
pub mod sink;
mod stream;

pub use self::core::{SupervisorError, TerminateOutcome, WorkerSupervisor};
pub use sink::{NoopLogSink, TracingLogSink};
