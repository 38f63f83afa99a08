//! Readiness gating for the worker.
//!
//! The prober sleeps one poll interval before every attempt, so attempt `n`
//! happens at `n × interval` and a never-ready worker is probed exactly
//! `ceil(timeout / interval)` times before the prober gives up.

use std::sync::Arc;
use std::time::Duration;

use paperlink_core::{HealthProbe, ReadinessCheck, ReadinessPolicy, ReadinessTimeout};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// A successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyReport {
    /// Attempt number that succeeded, starting at 1.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Result of gating startup on readiness under a [`ReadinessPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready(ReadyReport),
    /// Best-effort policy: the worker never answered, startup continued.
    ProceededAfterTimeout(ReadinessTimeout),
}

/// Polls the worker until it answers or the timeout elapses.
pub struct ReadinessProber {
    check: ReadinessCheck,
    probe: Arc<dyn HealthProbe>,
}

impl ReadinessProber {
    pub fn new(check: ReadinessCheck, probe: Arc<dyn HealthProbe>) -> Self {
        Self { check, probe }
    }

    /// Wait until the worker answers.
    ///
    /// Returns as soon as one probe succeeds; no further probes are issued
    /// after the first success or after the timeout.
    pub async fn wait_until_ready(&self) -> Result<ReadyReport, ReadinessTimeout> {
        let url = &self.check.target_url;
        let max_attempts = self.check.max_attempts();
        let started = Instant::now();
        let mut attempt: u32 = 0;

        info!(
            %url,
            interval_ms = self.check.poll_interval.as_millis(),
            timeout_ms = self.check.timeout.as_millis(),
            "Waiting for worker to be ready"
        );

        loop {
            attempt += 1;
            sleep(self.check.poll_interval).await;

            match self.probe.probe(url).await {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    info!(%url, attempt, elapsed_ms = elapsed.as_millis(), "Worker is ready");
                    return Ok(ReadyReport {
                        attempts: attempt,
                        elapsed,
                    });
                }
                Err(reason) => {
                    debug!(%url, attempt, %reason, "Worker not ready yet");
                }
            }

            let elapsed = started.elapsed();
            if attempt >= max_attempts || elapsed >= self.check.timeout {
                warn!(
                    %url,
                    attempts = attempt,
                    elapsed_ms = elapsed.as_millis(),
                    "Worker readiness timed out"
                );
                return Err(ReadinessTimeout {
                    target_url: url.clone(),
                    attempts: attempt,
                    elapsed,
                });
            }
        }
    }

    /// Wait for readiness and apply `policy` to a timeout.
    ///
    /// Best effort turns a timeout into [`ReadinessOutcome::ProceededAfterTimeout`];
    /// strict returns it as an error.
    pub async fn gate(
        &self,
        policy: ReadinessPolicy,
    ) -> Result<ReadinessOutcome, ReadinessTimeout> {
        match self.wait_until_ready().await {
            Ok(report) => Ok(ReadinessOutcome::Ready(report)),
            Err(timeout) => match policy {
                ReadinessPolicy::BestEffort => {
                    warn!(error = %timeout, "Continuing startup without a ready worker");
                    Ok(ReadinessOutcome::ProceededAfterTimeout(timeout))
                }
                ReadinessPolicy::Strict => Err(timeout),
            },
        }
    }
}
