//! Host startup and shutdown orchestration.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use paperlink_core::WorkerStatus;
use paperlink_runtime::{ReadinessOutcome, TerminateOutcome, WorkerSupervisor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bootstrap::HostContext;
use crate::error::HostError;

/// Force exit if shutdown takes longer than this.
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);
/// How long to wait for the worker to exit after the termination request.
const WORKER_EXIT_GRACE: Duration = Duration::from_secs(5);
/// How long to wait for the log stream to close.
const BRIDGE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// What startup achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReadiness {
    /// Development mode: the UI does not wait for the worker.
    NotGated,
    Ready { attempts: u32 },
    /// Best effort: the worker never answered and startup continued.
    TimedOut { attempts: u32 },
    /// The worker could not be launched; the UI runs without it.
    LaunchFailed(String),
}

/// Why the host is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    CtrlC,
    Terminate,
    Hangup,
    /// A panic on any thread, including inside a spawned task.
    Panic,
    StartupFailed,
}

impl ShutdownTrigger {
    /// Whether the host should report failure after shutting down.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Panic | Self::StartupFailed)
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CtrlC => write!(f, "ctrl-c"),
            Self::Terminate => write!(f, "SIGTERM"),
            Self::Hangup => write!(f, "SIGHUP"),
            Self::Panic => write!(f, "panic"),
            Self::StartupFailed => write!(f, "startup failure"),
        }
    }
}

/// Launch the worker, gate on readiness, then connect the log stream.
///
/// A launch failure is logged and reported but not fatal: the host keeps
/// running without a worker. A readiness timeout is fatal only under the
/// strict policy.
pub async fn startup(ctx: &HostContext) -> Result<WorkerReadiness, HostError> {
    info!(mode = %ctx.settings.mode, "Starting worker");

    let readiness = match ctx.supervisor.start() {
        Err(e) => {
            error!(error = %e, "Worker failed to launch, continuing without it");
            WorkerReadiness::LaunchFailed(e.to_string())
        }
        Ok(_) if !ctx.settings.mode.gates_on_readiness() => WorkerReadiness::NotGated,
        Ok(_) => match ctx.prober.gate(ctx.settings.readiness_policy()).await? {
            ReadinessOutcome::Ready(report) => WorkerReadiness::Ready {
                attempts: report.attempts,
            },
            ReadinessOutcome::ProceededAfterTimeout(timeout) => WorkerReadiness::TimedOut {
                attempts: timeout.attempts,
            },
        },
    };

    ctx.bridge.connect();
    info!(?readiness, "Host started");
    Ok(readiness)
}

/// How startup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    Started(WorkerReadiness),
    /// An exit trigger fired first, for example while waiting for readiness.
    Interrupted(ShutdownTrigger),
}

/// Run [`startup`] while listening for exit triggers, so that a signal
/// during the readiness wait still reaches [`perform_shutdown`].
pub async fn startup_until_exit(
    ctx: &HostContext,
    triggers: &mut ExitTriggers,
) -> Result<StartupOutcome, HostError> {
    tokio::select! {
        result = startup(ctx) => result.map(StartupOutcome::Started),
        trigger = triggers.recv() => {
            info!(%trigger, "Exit requested during startup");
            Ok(StartupOutcome::Interrupted(trigger))
        }
    }
}

/// Gracefully shut the host down. Safe to call from several exit paths;
/// only the first call does the work.
///
/// # Shutdown sequence
/// 1. Spawn watchdog thread (force exit after 10s)
/// 2. Cancel background tasks and scans
/// 3. Disconnect the log stream (cancels any pending reconnect first)
/// 4. Send the worker its termination request and wait up to 5s for exit
pub async fn perform_shutdown(ctx: &HostContext, trigger: ShutdownTrigger) {
    if ctx.shutdown_started.swap(true, Ordering::SeqCst) {
        info!(%trigger, "Shutdown already in progress");
        return;
    }
    info!(%trigger, "Starting graceful shutdown");

    let (watchdog_cancel_tx, watchdog_cancel_rx) = std::sync::mpsc::channel::<()>();
    std::thread::spawn(move || {
        // Timeout means nobody cancelled us
        if watchdog_cancel_rx.recv_timeout(WATCHDOG_TIMEOUT).is_err() {
            eprintln!("SHUTDOWN WATCHDOG: cleanup exceeded 10 seconds - forcing exit");
            std::process::exit(1);
        }
    });

    ctx.cancel.cancel();
    ctx.bridge.shutdown(BRIDGE_CLOSE_GRACE).await;

    match ctx.supervisor.terminate() {
        Ok(TerminateOutcome::Signalled(pid)) => info!(pid, "Waiting for worker to exit"),
        Ok(outcome) => info!(?outcome, "No termination request needed"),
        Err(e) => warn!(error = %e, "Could not signal worker"),
    }

    match ctx.supervisor.wait_for_exit(WORKER_EXIT_GRACE).await {
        Some(WorkerStatus::Exited(code)) => info!(?code, "Worker stopped"),
        Some(status) => info!(%status, "Worker was not running"),
        None => warn!(
            "Worker still running after {:?}, leaving it to exit on its own",
            WORKER_EXIT_GRACE
        ),
    }

    let _ = watchdog_cancel_tx.send(());
    info!("Graceful shutdown complete");
}

/// Turn a panic on any thread into a [`ShutdownTrigger::Panic`].
///
/// A panic inside a spawned task does not end the process, so the worker is
/// not signalled here; the host shuts down through [`perform_shutdown`]
/// instead. Only when nobody listens for triggers any more (the process is
/// already going down) does the hook send the termination request itself.
pub fn install_panic_hook(
    supervisor: &Arc<WorkerSupervisor>,
    triggers: mpsc::UnboundedSender<ShutdownTrigger>,
) {
    let supervisor = Arc::downgrade(supervisor);
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        previous(panic_info);
        if triggers.send(ShutdownTrigger::Panic).is_err() {
            if let Some(supervisor) = supervisor.upgrade() {
                let _ = supervisor.terminate();
            }
        }
    }));
}

#[cfg(unix)]
struct UnixSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl UnixSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }
}

/// Every source that can end the host.
///
/// Install it before the worker starts: from then on SIGINT, SIGTERM and
/// SIGHUP no longer kill the host outright but are delivered by
/// [`ExitTriggers::recv`]. Other triggers (a panic hook, tests) arrive
/// through [`ExitTriggers::sender`].
pub struct ExitTriggers {
    tx: mpsc::UnboundedSender<ShutdownTrigger>,
    rx: mpsc::UnboundedReceiver<ShutdownTrigger>,
    #[cfg(unix)]
    signals: Option<UnixSignals>,
}

impl ExitTriggers {
    /// Start listening. Must be called from within a Tokio runtime.
    pub fn install() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        #[cfg(unix)]
        let signals = match UnixSignals::install() {
            Ok(signals) => Some(signals),
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to install signal handlers, only ctrl-c will stop the host"
                );
                None
            }
        };

        Self {
            tx,
            rx,
            #[cfg(unix)]
            signals,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ShutdownTrigger> {
        self.tx.clone()
    }

    /// Resolve with the next trigger.
    pub async fn recv(&mut self) -> ShutdownTrigger {
        #[cfg(unix)]
        {
            if let Some(signals) = self.signals.as_mut() {
                return tokio::select! {
                    // `self.tx` keeps the channel open
                    Some(trigger) = self.rx.recv() => trigger,
                    _ = signals.interrupt.recv() => ShutdownTrigger::CtrlC,
                    _ = signals.terminate.recv() => ShutdownTrigger::Terminate,
                    _ = signals.hangup.recv() => ShutdownTrigger::Hangup,
                };
            }
        }

        tokio::select! {
            Some(trigger) = self.rx.recv() => trigger,
            trigger = ctrl_c() => trigger,
        }
    }
}

async fn ctrl_c() -> ShutdownTrigger {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    ShutdownTrigger::CtrlC
}

/// Print every log store update as `[module] message` until cancelled.
pub fn spawn_log_renderer(ctx: &HostContext) -> JoinHandle<()> {
    let mut updates = ctx.store.subscribe();
    let cancel = ctx.cancel.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                update = updates.recv() => match update {
                    Ok(update) => {
                        if let Some(line) = crate::render::render_update(&update) {
                            println!("{line}");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Log renderer fell behind");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}
