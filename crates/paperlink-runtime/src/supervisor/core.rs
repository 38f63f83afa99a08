//! Worker process lifecycle.
//!
//! [`WorkerSupervisor`] launches the extraction worker once per application
//! lifetime, forwards its output in production mode, watches for its exit,
//! and sends at most one termination request no matter how many exit paths
//! fire during shutdown.
//!
//! The child handle lives under the state lock, and it is only reaped while
//! that lock is held. A termination request therefore never reaches a pid
//! whose exit has already been collected.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use paperlink_core::{
    SpawnError, WorkerInvocation, WorkerLogSinkPort, WorkerStatus, WorkerStream,
};
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::signal::{Delivery, request_termination};
use super::stream::spawn_stream_reader;

/// Failure to deliver a termination request.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to signal worker (pid {pid}): {reason}")]
    Signal { pid: u32, reason: String },
}

/// What a call to [`WorkerSupervisor::terminate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// A termination request was delivered to this pid.
    Signalled(u32),
    /// An earlier call already delivered the request.
    AlreadySignalled,
    /// Never started, or already exited. Nothing to do.
    NotRunning,
}

#[derive(Debug)]
struct RunningWorker {
    pid: u32,
    child: Child,
}

#[derive(Debug, Default)]
struct SupervisorState {
    /// Set once a process was successfully created.
    launched: bool,
    /// The live process; cleared in the same critical section that reaps it.
    running: Option<RunningWorker>,
    /// Set once a termination request reached the process.
    signalled: bool,
}

struct Shared {
    state: Mutex<SupervisorState>,
    status_tx: watch::Sender<WorkerStatus>,
    signals_sent: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_exit(&self, state: &mut SupervisorState, result: io::Result<ExitStatus>) {
        let pid = state.running.take().map(|worker| worker.pid);
        let code = match result {
            Ok(status) => {
                info!(?pid, code = ?status.code(), "Worker exited");
                status.code()
            }
            Err(e) => {
                warn!(?pid, error = %e, "Failed to wait on worker");
                None
            }
        };
        self.status_tx.send_replace(WorkerStatus::Exited(code));
    }

    /// Poll the child for exit with the state lock held.
    fn poll_exit(&self, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.lock();
        let Some(worker) = state.running.as_mut() else {
            return Poll::Ready(());
        };
        let polled = {
            let wait = std::pin::pin!(worker.child.wait());
            wait.poll(cx)
        };
        match polled {
            Poll::Ready(result) => {
                self.record_exit(&mut state, result);
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Owns the single worker process of this application.
///
/// Share it behind an `Arc`; dropping the last reference sends the
/// termination request if it has not been sent yet.
pub struct WorkerSupervisor {
    invocation: WorkerInvocation,
    sink: Arc<dyn WorkerLogSinkPort>,
    shared: Arc<Shared>,
}

impl WorkerSupervisor {
    pub fn new(invocation: WorkerInvocation, sink: Arc<dyn WorkerLogSinkPort>) -> Self {
        let (status_tx, _) = watch::channel(WorkerStatus::NotStarted);
        Self {
            invocation,
            sink,
            shared: Arc::new(Shared {
                state: Mutex::new(SupervisorState::default()),
                status_tx,
                signals_sent: AtomicUsize::new(0),
            }),
        }
    }

    /// Launch the worker. Must be called from within a Tokio runtime.
    ///
    /// Returns the pid. A second call returns [`SpawnError::AlreadyLaunched`],
    /// even after the first worker exited; a failed launch is not retried.
    pub fn start(&self) -> Result<u32, SpawnError> {
        let mut state = self.shared.lock();
        if state.launched {
            return Err(SpawnError::AlreadyLaunched(state.running.as_ref().map(|w| w.pid)));
        }

        self.shared.status_tx.send_replace(WorkerStatus::Starting);
        let mut child = match self.spawn_child() {
            Ok(child) => child,
            Err(e) => {
                error!(error = %e, mode = %self.invocation.mode, "Failed to start worker");
                self.shared.status_tx.send_replace(WorkerStatus::NotStarted);
                return Err(e);
            }
        };

        let Some(pid) = child.id() else {
            // Reaped before we could look at it
            state.launched = true;
            self.shared.status_tx.send_replace(WorkerStatus::Exited(None));
            return Err(SpawnError::Os {
                program: self.invocation.program.display().to_string(),
                reason: "process exited before its pid could be read".to_string(),
            });
        };

        state.launched = true;
        self.spawn_output_readers(&mut child, pid);
        state.running = Some(RunningWorker { pid, child });
        self.shared.status_tx.send_replace(WorkerStatus::Running);

        info!(
            pid,
            mode = %self.invocation.mode,
            program = %self.invocation.program.display(),
            "Worker started"
        );

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { std::future::poll_fn(|cx| shared.poll_exit(cx)).await });

        Ok(pid)
    }

    fn spawn_child(&self) -> Result<Child, SpawnError> {
        let invocation = &self.invocation;

        let entry = invocation.entry_point();
        if !entry.exists() {
            return Err(SpawnError::NotFound(entry.clone()));
        }
        if !invocation.working_dir.is_dir() {
            return Err(SpawnError::MissingWorkingDir(invocation.working_dir.clone()));
        }

        let mut cmd = Command::new(&invocation.program);
        if let Some(script) = &invocation.script {
            cmd.arg(script);
        }
        cmd.current_dir(&invocation.working_dir)
            .stdin(Stdio::null());

        if invocation.mode.captures_output() {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        cmd.spawn().map_err(|e| SpawnError::Os {
            program: invocation.program.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn spawn_output_readers(&self, child: &mut Child, pid: u32) {
        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, pid, WorkerStream::Stdout, Arc::clone(&self.sink));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, pid, WorkerStream::Stderr, Arc::clone(&self.sink));
        }
    }

    /// Ask the worker to exit.
    ///
    /// Safe to call from any exit path, any number of times: the request is
    /// delivered at most once, and calls before start or after exit are
    /// no-ops.
    pub fn terminate(&self) -> Result<TerminateOutcome, SupervisorError> {
        let mut state = self.shared.lock();
        if state.signalled {
            debug!("Worker termination already requested");
            return Ok(TerminateOutcome::AlreadySignalled);
        }

        let exited = match state.running.as_mut().map(|w| w.child.try_wait()) {
            None => {
                debug!(status = %self.status(), "Worker not running, nothing to terminate");
                return Ok(TerminateOutcome::NotRunning);
            }
            Some(Ok(exit)) => exit,
            Some(Err(e)) => {
                debug!(error = %e, "Could not check worker exit");
                None
            }
        };
        // Exited but not yet seen by the watcher
        if let Some(exit) = exited {
            self.shared.record_exit(&mut state, Ok(exit));
            return Ok(TerminateOutcome::NotRunning);
        }

        let Some(worker) = state.running.as_mut() else {
            return Ok(TerminateOutcome::NotRunning);
        };
        let pid = worker.pid;
        match request_termination(&mut worker.child) {
            Ok(Delivery::Delivered) => {
                state.signalled = true;
                self.shared.signals_sent.fetch_add(1, Ordering::SeqCst);
                info!(pid, "Sent termination request to worker");
                Ok(TerminateOutcome::Signalled(pid))
            }
            Ok(Delivery::ProcessGone) => {
                debug!(pid, "Worker already gone");
                Ok(TerminateOutcome::NotRunning)
            }
            Err(e) => {
                warn!(pid, error = %e, "Failed to signal worker");
                Err(SupervisorError::Signal {
                    pid,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn status(&self) -> WorkerStatus {
        *self.shared.status_tx.borrow()
    }

    /// Pid of the live worker, if any.
    pub fn pid(&self) -> Option<u32> {
        self.shared.lock().running.as_ref().map(|w| w.pid)
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Number of termination requests actually delivered. At most one.
    pub fn signals_sent(&self) -> usize {
        self.shared.signals_sent.load(Ordering::SeqCst)
    }

    /// Wait until the worker's exit has been observed, up to `grace`.
    ///
    /// Returns the final status, or `None` if the worker is still alive
    /// when the grace period ends. Returns immediately when the worker was
    /// never started.
    pub async fn wait_for_exit(&self, grace: Duration) -> Option<WorkerStatus> {
        let mut rx = self.subscribe();
        let wait = rx.wait_for(|status| !status.is_live());
        match tokio::time::timeout(grace, wait).await {
            Ok(Ok(status)) => Some(*status),
            // Sender lives as long as `self`
            Ok(Err(_)) => Some(self.status()),
            Err(_) => None,
        }
    }
}

impl Drop for WorkerSupervisor {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            warn!(error = %e, "Failed to terminate worker on drop");
        }
    }
}
