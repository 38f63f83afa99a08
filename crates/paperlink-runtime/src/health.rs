//! HTTP readiness probe for the worker.

use std::time::Duration;

use async_trait::async_trait;
use paperlink_core::HealthProbe;
use reqwest::Client;

/// Per-request timeout for a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Issues a `HEAD` request against the worker's root URL.
///
/// Any response that is not a 4xx or 5xx counts as ready; connection
/// errors and timeouts do not.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client,
}

impl HttpHealthProbe {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str) -> Result<(), String> {
        let response = self.client.head(url).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(format!("HTTP {status}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_worker_is_not_ready() {
        let probe = HttpHealthProbe::new().unwrap();
        // Port 9 (discard) is closed on any sane test machine
        let result = probe.probe("http://127.0.0.1:9").await;
        assert!(result.is_err());
    }
}
