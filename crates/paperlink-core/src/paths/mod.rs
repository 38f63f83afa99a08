//! Path resolution for the worker and host data.
//!
//! Resolution never touches the network and only reads process metadata
//! (current directory, current executable). Existence of the resolved
//! worker is checked at spawn time, not here.

mod error;
mod platform;
mod worker;

pub use error::PathError;
pub use platform::{app_root, data_root, log_dir, resource_root};
pub use worker::{
    DEV_WORKER_SCRIPT, WORKER_EXECUTABLE_STEM, default_interpreter, resolve_worker_invocation,
    worker_executable_name,
};
