//! HTTP client for a remote scheduler.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use strata_topology::ResourceTopologyNode;
use tracing::{debug, error, info};

use super::{SchedulerError, SchedulerFacade};

/// Scheduler reached over HTTP.
pub struct RemoteScheduler {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteScheduler {
    /// Connect to the scheduler and register the coordinator.
    ///
    /// Fails if the scheduler is unhealthy or refuses the root, which the
    /// caller treats as a fatal setup error.
    pub async fn connect(
        base_url: impl Into<String>,
        timeout: Duration,
        root: &ResourceTopologyNode,
    ) -> Result<Self, SchedulerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let scheduler = Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        };

        scheduler.check_health().await?;
        scheduler.register_resource(root).await?;

        info!(
            base_url = %scheduler.base_url,
            root_id = %root.id(),
            "Connected to remote scheduler"
        );
        Ok(scheduler)
    }

    async fn check_health(&self) -> Result<(), SchedulerError> {
        let url = format!("{}/healthz", self.base_url);
        debug!(url = %url, "Checking scheduler health");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Scheduler health check failed");
            return Err(SchedulerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl SchedulerFacade for RemoteScheduler {
    fn name(&self) -> &str {
        "remote"
    }

    async fn register_resource(&self, node: &ResourceTopologyNode) -> Result<(), SchedulerError> {
        let url = format!("{}/v1/resources", self.base_url);
        debug!(resource_id = %node.id(), "Registering resource with scheduler");

        let response = self.client.post(&url).json(node).send().await?;
        let status = response.status();

        // A scheduler that outlived a bridge restart already knows the node.
        if status == StatusCode::CONFLICT {
            debug!(resource_id = %node.id(), "Resource already registered");
            return Ok(());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, resource_id = %node.id(), "Registration failed");
            return Err(SchedulerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
