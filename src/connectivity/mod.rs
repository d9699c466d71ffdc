//! Connectivity gate
//!
//! Async "is the network reachable" predicate consulted before any progress
//! flow opens a surface.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ConnectivityConfig;

const COMPONENT: &str = "Connectivity";

/// Network reachability probe
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Probe that issues a HEAD request and treats any HTTP response as online
pub struct HttpConnectivityProbe {
    client: reqwest::Client,
    probe_url: String,
}

impl HttpConnectivityProbe {
    /// Create a probe from configuration
    pub fn new(config: &ConnectivityConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config.probe_url.clone(), config.timeout())
    }

    pub fn with_timeout(probe_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            probe_url: probe_url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_connected(&self) -> bool {
        match self.client.head(&self.probe_url).send().await {
            Ok(response) => {
                tracing::trace!(component = COMPONENT, status = %response.status(), url = %self.probe_url, "Connectivity probe answered");
                true
            }
            Err(e) => {
                tracing::debug!(component = COMPONENT, url = %self.probe_url, error = %e, "Connectivity probe failed");
                false
            }
        }
    }
}
