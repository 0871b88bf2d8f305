//! Reachability probes

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Attempts per probe
pub const PROBE_ATTEMPTS: u32 = 3;

/// Timeout of a single probe request
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks that an endpoint answers
#[async_trait]
pub trait Reachability: Send + Sync {
    /// True once the endpoint answers 200; never errors
    async fn probe(&self, url: &str) -> bool;
}

/// HTTP GET based health checker
#[derive(Debug, Clone)]
pub struct HttpHealthChecker {
    client: Client,
    attempts: u32,
}

impl HttpHealthChecker {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_settings(PROBE_ATTEMPTS, PROBE_TIMEOUT)
    }

    pub fn with_settings(attempts: u32, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            attempts: attempts.max(1),
        })
    }
}

#[async_trait]
impl Reachability for HttpHealthChecker {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> bool {
        for attempt in 1..=self.attempts {
            match self.client.get(url).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    debug!(attempt, "Endpoint reachable");
                    return true;
                }
                Ok(response) => {
                    debug!(attempt, status = %response.status(), "Endpoint answered without 200");
                }
                Err(e) => {
                    // Transport failures end the probe immediately
                    warn!(attempt, error = %e, "Endpoint unreachable");
                    return false;
                }
            }
        }
        warn!(attempts = self.attempts, "Endpoint never answered 200");
        false
    }
}
