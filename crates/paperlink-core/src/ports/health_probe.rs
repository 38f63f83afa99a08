//! Readiness probe port.

use async_trait::async_trait;

/// Single-shot reachability check against the worker.
///
/// The prober owns retry and timeout policy; a probe only answers
/// "did this one request succeed".
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Issue one lightweight request to `url`.
    ///
    /// Returns `Err` with a human-readable reason when the worker is not
    /// (yet) reachable.
    async fn probe(&self, url: &str) -> Result<(), String>;
}
