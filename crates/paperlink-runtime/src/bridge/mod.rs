//! Log stream bridge.
//!
//! Keeps one connection to the worker's log stream open, decodes each frame
//! and hands it to a [`LogEventSink`] in arrival order. When the stream
//! drops, a single reconnect is scheduled after a fixed delay. An explicit
//! [`LogStreamBridge::disconnect`] cancels any pending reconnect before the
//! transport is released, so no retry fires after teardown.
//!
//! State transitions happen under one mutex and are published on a `watch`
//! channel:
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Connected
//!      ^                        |                    |
//!      |                   open failed          closed / error
//!      |                        v                    v
//!      +----disconnect---- ReconnectScheduled <------+
//! ```

mod ws;

pub use ws::WsTransport;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use paperlink_core::domain::PING_PAYLOAD;
use paperlink_core::{
    ConnectionState, DEFAULT_LOG_STREAM_URL, DEFAULT_RECONNECT_DELAY_MS, InboundFrame,
    LogConnection, LogEventSink, LogTransport, MalformedMessage, TransportError,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Where and how the bridge connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub url: String,
    /// Fixed delay before a reconnect attempt.
    pub reconnect_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LOG_STREAM_URL.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Transport opens attempted.
    pub connect_attempts: u64,
    /// Reconnect timers armed.
    pub reconnects_scheduled: u64,
    pub events_delivered: u64,
    pub progress_updates: u64,
    pub pongs: u64,
    /// Frames dropped because they could not be decoded.
    pub malformed_frames: u64,
}

#[derive(Default)]
struct Counters {
    connect_attempts: AtomicU64,
    reconnects_scheduled: AtomicU64,
    events_delivered: AtomicU64,
    progress_updates: AtomicU64,
    pongs: AtomicU64,
    malformed_frames: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            progress_updates: self.progress_updates.load(Ordering::Relaxed),
            pongs: self.pongs.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
        }
    }
}

/// A connection attempt or open connection.
struct Session {
    id: u64,
    cancel: CancellationToken,
    /// Outbound text, available once the transport is open.
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

struct PendingReconnect {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    /// Cleared by an explicit disconnect; reconnects are only armed while set.
    auto_reconnect: bool,
    session: Option<Session>,
    reconnect: Option<PendingReconnect>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

struct Shared {
    config: BridgeConfig,
    transport: Arc<dyn LogTransport>,
    sink: Arc<dyn LogEventSink>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConnectionState>,
    counters: Counters,
    last_pong: Mutex<Option<Instant>>,
}

/// Handle to the log stream bridge. Cheap to clone.
#[derive(Clone)]
pub struct LogStreamBridge {
    shared: Arc<Shared>,
}

impl LogStreamBridge {
    pub fn new(
        config: BridgeConfig,
        transport: Arc<dyn LogTransport>,
        sink: Arc<dyn LogEventSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                sink,
                inner: Mutex::new(Inner::default()),
                state_tx,
                counters: Counters::default(),
                last_pong: Mutex::new(None),
            }),
        }
    }

    /// Bridge over a real websocket.
    pub fn websocket(config: BridgeConfig, sink: Arc<dyn LogEventSink>) -> Self {
        Self::new(config, Arc::new(WsTransport), sink)
    }

    /// Open the stream and keep it open.
    ///
    /// No-op while a connection attempt is in flight or a connection is
    /// open. Supersedes a pending reconnect. Must be called from within a
    /// Tokio runtime.
    pub fn connect(&self) {
        let mut inner = self.shared.lock();
        inner.auto_reconnect = true;
        self.shared.connect_locked(&mut inner);
    }

    /// Close the stream and stop reconnecting.
    ///
    /// The pending reconnect timer is cancelled before the transport is
    /// released. The transport closes in the background; use
    /// [`LogStreamBridge::shutdown`] to wait for it.
    pub fn disconnect(&self) {
        drop(self.shared.teardown());
    }

    /// [`disconnect`](Self::disconnect), then wait up to `grace` for the
    /// transport to close.
    pub async fn shutdown(&self, grace: Duration) {
        let Some(task) = self.shared.teardown() else {
            return;
        };
        if tokio::time::timeout(grace, task).await.is_err() {
            warn!("Log stream did not close within {:?}", grace);
        }
    }

    /// Send a keepalive ping. Returns whether it was queued.
    pub fn ping(&self) -> bool {
        let inner = self.shared.lock();
        if !self.shared.state().is_connected() {
            return false;
        }
        inner
            .session
            .as_ref()
            .and_then(|session| session.outbound.as_ref())
            .is_some_and(|tx| tx.send(PING_PAYLOAD.to_string()).is_ok())
    }

    /// Ping every `every` while connected, until `cancel` fires.
    pub fn spawn_keepalive(&self, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let bridge = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if bridge.ping() {
                            trace!("Sent log stream keepalive");
                        }
                    }
                }
            }
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Whether a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.shared.lock().reconnect.is_some()
    }

    pub fn stats(&self) -> BridgeStats {
        self.shared.counters.snapshot()
    }

    /// When the worker last answered a ping.
    pub fn last_pong(&self) -> Option<Instant> {
        *self
            .shared
            .last_pong
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Arm a reconnect as if the stream had just dropped.
    #[cfg(test)]
    pub(crate) fn schedule_reconnect(&self) {
        let mut inner = self.shared.lock();
        self.shared.schedule_reconnect_locked(&mut inner);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Log stream state changed");
        }
    }

    fn connect_locked(self: &Arc<Self>, inner: &mut Inner) {
        if inner.session.is_some() {
            debug!(state = %self.state(), "Log stream already connecting or connected");
            return;
        }
        if let Some(pending) = inner.reconnect.take() {
            pending.cancel.cancel();
        }

        let id = inner.next_id();
        let cancel = CancellationToken::new();
        self.set_state(ConnectionState::Connecting);
        Counters::bump(&self.counters.connect_attempts);

        let task = tokio::spawn(Arc::clone(self).run_session(id, cancel.clone()));
        inner.session = Some(Session {
            id,
            cancel,
            outbound: None,
            task: Some(task),
        });
    }

    fn teardown(&self) -> Option<JoinHandle<()>> {
        let mut inner = self.lock();
        inner.auto_reconnect = false;
        if let Some(pending) = inner.reconnect.take() {
            pending.cancel.cancel();
            debug!("Cancelled pending log stream reconnect");
        }
        let task = inner.session.take().and_then(|mut session| {
            session.cancel.cancel();
            session.task.take()
        });
        self.set_state(ConnectionState::Disconnected);
        task
    }

    fn schedule_reconnect_locked(self: &Arc<Self>, inner: &mut Inner) {
        if !inner.auto_reconnect {
            return;
        }
        if inner.reconnect.is_some() {
            debug!("Log stream reconnect already pending");
            return;
        }

        let id = inner.next_id();
        let cancel = CancellationToken::new();
        inner.reconnect = Some(PendingReconnect {
            id,
            cancel: cancel.clone(),
        });
        self.set_state(ConnectionState::ReconnectScheduled);
        Counters::bump(&self.counters.reconnects_scheduled);

        let delay = self.config.reconnect_delay;
        info!(delay_ms = delay.as_millis(), "Log stream reconnect scheduled");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => shared.fire_reconnect(id),
            }
        });
    }

    fn fire_reconnect(self: &Arc<Self>, id: u64) {
        let mut inner = self.lock();
        if inner.reconnect.as_ref().is_none_or(|pending| pending.id != id) {
            return;
        }
        inner.reconnect = None;
        if inner.auto_reconnect {
            info!(url = %self.config.url, "Reconnecting to log stream");
            self.connect_locked(&mut inner);
        }
    }

    /// Records the open transport. Returns false if the session was torn
    /// down while opening.
    fn mark_connected(&self, id: u64, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut inner = self.lock();
        match inner.session.as_mut() {
            Some(session) if session.id == id => {
                session.outbound = Some(outbound);
                self.set_state(ConnectionState::Connected);
                true
            }
            _ => false,
        }
    }

    fn session_ended(self: &Arc<Self>, id: u64) {
        let mut inner = self.lock();
        if inner.session.as_ref().is_none_or(|session| session.id != id) {
            return;
        }
        inner.session = None;
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect_locked(&mut inner);
    }

    async fn run_session(self: Arc<Self>, id: u64, cancel: CancellationToken) {
        let url = self.config.url.clone();
        let opened = tokio::select! {
            () = cancel.cancelled() => return,
            result = self.transport.open(&url) => result,
        };

        let mut conn = match opened {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Log stream connection failed");
                self.session_ended(id);
                return;
            }
        };

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        if !self.mark_connected(id, outbound_tx) {
            conn.close().await;
            return;
        }
        info!(%url, "Log stream connected");

        let ended_by_peer = self.pump(conn.as_mut(), &mut outbound_rx, &cancel).await;
        conn.close().await;
        if ended_by_peer {
            self.session_ended(id);
        } else {
            debug!("Log stream closed by host");
        }
    }

    /// Moves frames until the peer goes away (returns true) or the session
    /// is cancelled (returns false).
    async fn pump(
        &self,
        conn: &mut dyn LogConnection,
        outbound: &mut mpsc::UnboundedReceiver<String>,
        cancel: &CancellationToken,
    ) -> bool {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return false,
                Some(text) = outbound.recv() => {
                    if let Err(e) = conn.send_text(&text).await {
                        debug!(error = %e, "Failed to send on log stream");
                    }
                }
                frame = conn.recv() => match frame {
                    Some(Ok(payload)) => self.handle_payload(&payload),
                    Some(Err(TransportError::Undecodable(e))) => self.drop_malformed(&e),
                    Some(Err(e)) => {
                        warn!(error = %e, "Log stream error");
                        return true;
                    }
                    None => {
                        info!("Log stream closed by worker");
                        return true;
                    }
                },
            }
        }
    }

    fn handle_payload(&self, payload: &str) {
        match InboundFrame::parse(payload) {
            Ok(InboundFrame::Log(event)) => {
                Counters::bump(&self.counters.events_delivered);
                self.sink.deliver(event);
            }
            Ok(InboundFrame::Progress(update)) => {
                Counters::bump(&self.counters.progress_updates);
                self.sink.progress(update);
            }
            Ok(InboundFrame::Pong) => {
                Counters::bump(&self.counters.pongs);
                let now = Some(Instant::now());
                *self.last_pong.lock().unwrap_or_else(PoisonError::into_inner) = now;
                trace!("Log stream pong");
            }
            Err(e) => self.drop_malformed(&e),
        }
    }

    fn drop_malformed(&self, err: &MalformedMessage) {
        Counters::bump(&self.counters.malformed_frames);
        warn!(error = %err, "Dropping malformed log frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paperlink_core::{AnalyzeProgress, LogEvent};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;

    enum ServerFrame {
        Text(String),
        Undecodable,
        Error,
        Close,
    }

    /// Test-side handle to one fake connection.
    struct ServerEnd {
        tx: mpsc::UnboundedSender<ServerFrame>,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl ServerEnd {
        fn send(&self, text: &str) {
            self.tx.send(ServerFrame::Text(text.to_string())).unwrap();
        }
    }

    struct FakeConnection {
        rx: mpsc::UnboundedReceiver<ServerFrame>,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LogConnection for FakeConnection {
        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            match self.rx.recv().await {
                Some(ServerFrame::Text(text)) => Some(Ok(text)),
                Some(ServerFrame::Undecodable) => Some(Err(TransportError::Undecodable(
                    MalformedMessage::new("\u{fffd}", "binary frame is not UTF-8"),
                ))),
                Some(ServerFrame::Error) => Some(Err(TransportError::Read("reset".to_string()))),
                Some(ServerFrame::Close) | None => None,
            }
        }

        async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        refuse: AtomicBool,
        opens: AtomicU64,
        servers: Mutex<VecDeque<ServerEnd>>,
    }

    impl FakeTransport {
        fn opens(&self) -> u64 {
            self.opens.load(Ordering::SeqCst)
        }

        fn take_server(&self) -> ServerEnd {
            self.servers.lock().unwrap().pop_front().expect("no open connection")
        }
    }

    #[async_trait]
    impl LogTransport for FakeTransport {
        async fn open(&self, url: &str) -> Result<Box<dyn LogConnection>, TransportError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.refuse.load(Ordering::SeqCst) {
                return Err(TransportError::Connect {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            let (tx, rx) = mpsc::unbounded_channel();
            let sent = Arc::new(Mutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            self.servers.lock().unwrap().push_back(ServerEnd {
                tx,
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            });
            Ok(Box::new(FakeConnection { rx, sent, closed }))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<LogEvent>>,
        progress: Mutex<Vec<AnalyzeProgress>>,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.message.clone())
                .collect()
        }
    }

    impl LogEventSink for RecordingSink {
        fn deliver(&self, event: LogEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn progress(&self, update: AnalyzeProgress) {
            self.progress.lock().unwrap().push(update);
        }
    }

    fn fixture() -> (LogStreamBridge, Arc<FakeTransport>, Arc<RecordingSink>) {
        let transport = Arc::new(FakeTransport::default());
        let sink = Arc::new(RecordingSink::default());
        let bridge = LogStreamBridge::new(BridgeConfig::default(), transport.clone(), sink.clone());
        (bridge, transport, sink)
    }

    /// Let spawned tasks run without letting paused time auto-advance.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn analyze(message: &str) -> String {
        format!(r#"{{"module":"analyze","message":"{message}"}}"#)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_and_deliver_in_order() {
        let (bridge, transport, sink) = fixture();
        bridge.connect();
        settle().await;
        assert_eq!(bridge.state(), ConnectionState::Connected);

        let server = transport.take_server();
        server.send(&analyze("a"));
        server.send(&analyze("b"));
        server.send(&analyze("c"));
        settle().await;

        assert_eq!(sink.messages(), vec!["a", "b", "c"]);
        assert_eq!(bridge.stats().events_delivered, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_is_isolated() {
        let (bridge, transport, sink) = fixture();
        bridge.connect();
        settle().await;

        let server = transport.take_server();
        server.send(&analyze("a"));
        server.send("{not json");
        server.send(r#"{"module":"nope","message":"x"}"#);
        server.send(&analyze("b"));
        settle().await;

        assert_eq!(sink.messages(), vec!["a", "b"]);
        assert_eq!(bridge.stats().malformed_frames, 2);
        assert_eq!(bridge.state(), ConnectionState::Connected);
        assert!(!bridge.reconnect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_frame_is_isolated() {
        let (bridge, transport, sink) = fixture();
        bridge.connect();
        settle().await;

        let server = transport.take_server();
        server.send(&analyze("a"));
        server.tx.send(ServerFrame::Undecodable).unwrap();
        server.send(&analyze("b"));
        settle().await;

        assert_eq!(sink.messages(), vec!["a", "b"]);
        assert_eq!(bridge.stats().malformed_frames, 1);
        assert_eq!(bridge.state(), ConnectionState::Connected);
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_and_pong_frames() {
        let (bridge, transport, sink) = fixture();
        assert!(bridge.last_pong().is_none());
        bridge.connect();
        settle().await;

        let server = transport.take_server();
        server.send(r#"{"type":"progress","data":{"currentFileIndex":1,"totalFiles":4,"progress":25.0}}"#);
        server.send("pong");
        settle().await;

        let progress = sink.progress.lock().unwrap().clone();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].total_files, 4);
        assert!(sink.messages().is_empty());

        let stats = bridge.stats();
        assert_eq!(stats.pongs, 1);
        assert_eq!(bridge.last_pong(), Some(Instant::now()));
        assert_eq!(stats.malformed_frames, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_fires_after_delay() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        settle().await;

        transport.take_server().tx.send(ServerFrame::Close).unwrap();
        settle().await;
        assert_eq!(bridge.state(), ConnectionState::ReconnectScheduled);
        assert!(bridge.reconnect_pending());
        assert_eq!(transport.opens(), 1);

        tokio::time::advance(Duration::from_millis(2_999)).await;
        settle().await;
        assert_eq!(transport.opens(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(transport.opens(), 2);
        assert_eq!(bridge.state(), ConnectionState::Connected);
        assert!(!bridge.reconnect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_schedules_reconnect() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        settle().await;

        let server = transport.take_server();
        server.tx.send(ServerFrame::Error).unwrap();
        settle().await;

        assert_eq!(bridge.state(), ConnectionState::ReconnectScheduled);
        assert!(server.closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_reconnect_in_flight() {
        let (bridge, transport, _sink) = fixture();
        transport.refuse.store(true, Ordering::SeqCst);
        bridge.connect();
        settle().await;
        assert_eq!(bridge.state(), ConnectionState::ReconnectScheduled);

        for _ in 0..5 {
            bridge.schedule_reconnect();
        }
        assert_eq!(bridge.stats().reconnects_scheduled, 1);

        tokio::time::advance(Duration::from_millis(3_000)).await;
        settle().await;
        // One timer fired, one attempt, which failed and armed one new timer
        assert_eq!(transport.opens(), 2);
        assert_eq!(bridge.stats().reconnects_scheduled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_is_noop_while_connected() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        bridge.connect();
        settle().await;
        bridge.connect();
        settle().await;

        assert_eq!(transport.opens(), 1);
        assert_eq!(bridge.stats().connect_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        settle().await;

        transport.take_server().tx.send(ServerFrame::Close).unwrap();
        settle().await;
        assert!(bridge.reconnect_pending());

        bridge.disconnect();
        assert!(!bridge.reconnect_pending());
        assert_eq!(bridge.state(), ConnectionState::Disconnected);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(bridge.state(), ConnectionState::Disconnected);

        // An explicit connect after teardown works again
        bridge.connect();
        settle().await;
        assert_eq!(transport.opens(), 2);
        assert_eq!(bridge.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_closes_open_transport_without_reconnect() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        settle().await;
        let server = transport.take_server();

        bridge.shutdown(Duration::from_secs(1)).await;
        assert!(server.closed.load(Ordering::SeqCst));
        assert_eq!(bridge.state(), ConnectionState::Disconnected);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(transport.opens(), 1);
        assert!(!bridge.reconnect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_only_when_connected() {
        let (bridge, transport, _sink) = fixture();
        assert!(!bridge.ping());

        bridge.connect();
        settle().await;
        let server = transport.take_server();

        assert!(bridge.ping());
        settle().await;
        assert_eq!(*server.sent.lock().unwrap(), vec!["ping".to_string()]);

        bridge.disconnect();
        assert!(!bridge.ping());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_pings_periodically() {
        let (bridge, transport, _sink) = fixture();
        bridge.connect();
        settle().await;
        let server = transport.take_server();

        let cancel = CancellationToken::new();
        let handle = bridge.spawn_keepalive(Duration::from_secs(10), cancel.clone());
        settle().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(server.sent.lock().unwrap().len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
