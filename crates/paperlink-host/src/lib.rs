//! Headless desktop host for paperlink.
//!
//! Composes the runtime adapters into a running host: launches the worker,
//! gates on readiness, streams worker logs into the log store, answers UI
//! requests over a JSON-lines channel, and tears everything down on exit.

pub mod bootstrap;
pub mod channel;
pub mod cli;
pub mod commands;
pub mod error;
pub mod lifecycle;
pub mod render;

pub use bootstrap::{HostContext, HostDeps, bootstrap, bootstrap_with};
pub use channel::{serve_commands, spawn_command_channel};
pub use commands::{CommandDispatcher, HeadlessDialogs};
pub use error::HostError;
pub use lifecycle::{
    ExitTriggers, ShutdownTrigger, StartupOutcome, WorkerReadiness, install_panic_hook,
    perform_shutdown, spawn_log_renderer, startup, startup_until_exit,
};
