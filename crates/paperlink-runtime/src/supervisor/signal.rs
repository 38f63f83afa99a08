//! Termination request for the worker process.
//!
//! Unix gets SIGTERM so the worker can run its own cleanup, and nothing
//! escalates from there. Windows has no graceful signal for a windowless
//! console process, so the child is killed outright.

use std::io;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tokio::process::Child;

/// Result of asking the OS to terminate a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The request reached a live process.
    Delivered,
    /// No such process; it already exited.
    ProcessGone,
}

#[cfg(unix)]
#[allow(clippy::needless_pass_by_ref_mut)] // shared signature with the Windows kill
pub(crate) fn request_termination(child: &mut Child) -> io::Result<Delivery> {
    // `id` is cleared once the exit has been reaped
    let Some(pid) = child.id() else {
        return Ok(Delivery::ProcessGone);
    };
    let raw = i32::try_from(pid).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range"))
    })?;

    match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(Delivery::Delivered),
        Err(nix::errno::Errno::ESRCH) => Ok(Delivery::ProcessGone),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
pub(crate) fn request_termination(child: &mut Child) -> io::Result<Delivery> {
    if child.id().is_none() {
        return Ok(Delivery::ProcessGone);
    }
    match child.start_kill() {
        Ok(()) => Ok(Delivery::Delivered),
        // Raised for a process that already exited
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(Delivery::ProcessGone),
        Err(e) => Err(e),
    }
}


#[cfg(all(test, windows))]
mod windows_tests {
    use super::*;
    use std::process::Stdio;

    #[tokio::test]
    async fn test_kill_stops_console_child() {
        let mut child = tokio::process::Command::new("ping")
            .args(["-n", "30", "127.0.0.1"])
            .stdout(Stdio::null())
            .spawn()
            .expect("failed to spawn ping");

        assert_eq!(request_termination(&mut child).unwrap(), Delivery::Delivered);
        let status = child.wait().await.unwrap();
        assert!(!status.success());
        assert_eq!(request_termination(&mut child).unwrap(), Delivery::ProcessGone);
    }
}
