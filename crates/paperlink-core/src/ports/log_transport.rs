//! Log stream transport ports.
//!
//! The bridge drives its state machine against these traits so it can be
//! exercised without a real websocket.

use async_trait::async_trait;

use crate::errors::TransportError;

/// Factory for log stream connections.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Open a connection to `url`. Resolves once the transport is open.
    async fn open(&self, url: &str) -> Result<Box<dyn LogConnection>, TransportError>;
}

/// One open log stream connection.
///
/// `recv` must be cancellation-safe: the bridge polls it inside
/// `tokio::select!` alongside outbound writes and teardown.
#[async_trait]
pub trait LogConnection: Send {
    /// Next text payload. `None` means the peer closed the stream cleanly.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Send a text payload.
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Close the connection. Errors are swallowed; the connection is gone
    /// either way.
    async fn close(&mut self);
}
