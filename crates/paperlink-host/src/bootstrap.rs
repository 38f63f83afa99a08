//! Host bootstrap - the composition root.
//!
//! This is the only place where the concrete adapters are wired together:
//! - Worker supervisor with the tracing output sink (paperlink-runtime)
//! - HTTP readiness prober (paperlink-runtime)
//! - Websocket log stream bridge feeding the log store (paperlink-runtime)
//! - Command dispatcher with headless dialogs and the log store
//!
//! Tests use [`bootstrap_with`] to swap any adapter for a fake.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use paperlink_core::{
    DialogPort, HealthProbe, LogTransport, Settings, WorkerInvocation, WorkerLogSinkPort,
    resolve_worker_invocation, validate_settings,
};
use paperlink_runtime::{
    BridgeConfig, HttpHealthProbe, LogStore, LogStreamBridge, ReadinessProber, TracingLogSink,
    WorkerSupervisor, WsTransport,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::{CommandDispatcher, HeadlessDialogs};

/// Adapters the host is composed from.
pub struct HostDeps {
    pub invocation: WorkerInvocation,
    pub worker_sink: Arc<dyn WorkerLogSinkPort>,
    pub probe: Arc<dyn HealthProbe>,
    pub transport: Arc<dyn LogTransport>,
    pub dialogs: Arc<dyn DialogPort>,
}

impl HostDeps {
    /// Production adapters for `settings`.
    pub fn production(settings: &Settings) -> Result<Self> {
        let invocation =
            resolve_worker_invocation(settings).context("Failed to resolve worker location")?;
        let probe = HttpHealthProbe::new().context("Failed to build HTTP client")?;
        Ok(Self {
            invocation,
            worker_sink: Arc::new(TracingLogSink),
            probe: Arc::new(probe),
            transport: Arc::new(WsTransport),
            dialogs: Arc::new(HeadlessDialogs),
        })
    }
}

/// Fully composed host.
pub struct HostContext {
    pub settings: Settings,
    pub supervisor: Arc<WorkerSupervisor>,
    pub prober: ReadinessProber,
    pub store: Arc<LogStore>,
    pub bridge: LogStreamBridge,
    pub dispatcher: CommandDispatcher,
    /// Cancelled at shutdown; stops background tasks and scans.
    pub cancel: CancellationToken,
    pub(crate) shutdown_started: AtomicBool,
}

/// Compose the host from settings with production adapters.
pub fn bootstrap(settings: Settings) -> Result<HostContext> {
    validate_settings(&settings).context("Invalid settings")?;
    let deps = HostDeps::production(&settings)?;
    Ok(bootstrap_with(settings, deps))
}

/// Compose the host from explicit adapters.
pub fn bootstrap_with(settings: Settings, deps: HostDeps) -> HostContext {
    info!(
        mode = %settings.mode,
        worker = %deps.invocation.entry_point().display(),
        "Bootstrapping host"
    );

    let cancel = CancellationToken::new();
    let store = Arc::new(LogStore::new(settings.log_buffer_cap.and_then(NonZeroUsize::new)));
    let supervisor = Arc::new(WorkerSupervisor::new(deps.invocation, deps.worker_sink));
    let prober = ReadinessProber::new(settings.readiness_check(), deps.probe);
    let bridge = LogStreamBridge::new(
        BridgeConfig {
            url: settings.log_stream_url.clone(),
            reconnect_delay: settings.reconnect_delay(),
        },
        deps.transport,
        store.clone(),
    );
    let dispatcher = CommandDispatcher::new(deps.dialogs, store.clone(), cancel.child_token());

    HostContext {
        settings,
        supervisor,
        prober,
        store,
        bridge,
        dispatcher,
        cancel,
        shutdown_started: AtomicBool::new(false),
    }
}
