//! Best-effort backend reachability probe
//!
//! Used only to enrich diagnostics when the push channel fails. The result
//! never affects the connection state.

use crate::error::TrackerError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Outcome of one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub reachable: bool,
    pub detail: String,
}

impl ProbeReport {
    pub fn reachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: true,
            detail: detail.into(),
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: detail.into(),
        }
    }
}

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> ProbeReport;
}

/// Probes `GET <base>/health`, falling back to `HEAD <base>/`
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    base_url: String,
}

impl HttpProbe {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TrackerError::Probe(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn health(&self) -> Result<u16, TrackerError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrackerError::Probe(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(TrackerError::Probe(format!("{} returned {}", url, status)))
        }
    }

    async fn root(&self) -> Result<u16, TrackerError> {
        let url = format!("{}/", self.base_url);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| TrackerError::Probe(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self) -> ProbeReport {
        match self.health().await {
            Ok(status) => return ProbeReport::reachable(format!("health check returned {}", status)),
            Err(e) => debug!(error = %e, "Health check failed, trying root"),
        }

        // Any HTTP answer from the root means the host is up
        match self.root().await {
            Ok(status) => ProbeReport::reachable(format!("root answered {}", status)),
            Err(e) => ProbeReport::unreachable(e.to_string()),
        }
    }
}
