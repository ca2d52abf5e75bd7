use anyhow::{Context, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::GatewayError;
use crate::config::HealthSettings;

/// Result of a single health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The gateway answered with a success status
    Ready,
    /// Connection refused, probe timed out or a non-success status
    NotReady(String),
}

/// Polls the gateway's health endpoint until it reports ready
///
/// Fixed interval, no backoff and no jitter: the gateway is local and the
/// only question is when it finishes booting.
pub struct HealthPoller {
    client: Client,
    interval: Duration,
    timeout: Duration,
}

impl HealthPoller {
    /// Create a poller from the health settings
    pub fn new(settings: &HealthSettings) -> Result<Self> {
        // The gateway is always local; environment proxies must not intercept it
        let client = Client::builder()
            .user_agent(format!("moltbot-desktop/{}", env!("CARGO_PKG_VERSION")))
            .timeout(settings.probe_timeout())
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            interval: settings.interval(),
            timeout: settings.timeout(),
        })
    }

    /// Issue one GET against `url`
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Ready,
            Ok(response) => ProbeOutcome::NotReady(format!("status {}", response.status())),
            Err(e) if e.is_timeout() => ProbeOutcome::NotReady("probe timed out".to_string()),
            Err(e) => ProbeOutcome::NotReady(e.to_string()),
        }
    }

    /// Probe `url` every interval until it succeeds or the timeout elapses
    ///
    /// Returns the number of probes it took. Failed probes are expected while
    /// the gateway boots and are only logged at debug level.
    pub async fn wait_for_ready(&self, url: &str) -> Result<u32, GatewayError> {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.probe(url).await {
                ProbeOutcome::Ready => {
                    tracing::debug!(
                        "Gateway ready after {} probes ({} ms)",
                        attempts,
                        started.elapsed().as_millis()
                    );
                    return Ok(attempts);
                }
                ProbeOutcome::NotReady(reason) => {
                    tracing::debug!("Gateway not ready yet (probe {}): {}", attempts, reason);
                }
            }

            if started.elapsed() > self.timeout {
                return Err(GatewayError::Timeout {
                    timeout: self.timeout,
                    attempts,
                });
            }

            sleep(self.interval).await;
        }
    }
}
