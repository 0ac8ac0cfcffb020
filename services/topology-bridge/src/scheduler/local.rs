//! In-process scheduler stand-in.
//!
//! Keeps the registered topology as a single tree so the bridge can run
//! without a remote scheduler. No placement decisions are made here.

use async_trait::async_trait;
use strata_topology::ResourceTopologyNode;
use tokio::sync::RwLock;
use tracing::debug;

use super::{SchedulerError, SchedulerFacade};

/// Scheduler that records registrations in memory.
pub struct LocalScheduler {
    topology: RwLock<ResourceTopologyNode>,
}

impl LocalScheduler {
    /// Create a scheduler rooted at the coordinator's topology node.
    pub fn new(root: ResourceTopologyNode) -> Self {
        Self {
            topology: RwLock::new(root),
        }
    }

    /// Snapshot of the registered tree.
    pub async fn topology(&self) -> ResourceTopologyNode {
        self.topology.read().await.clone()
    }

    /// Number of resources in the registered tree, coordinator included.
    pub async fn resource_count(&self) -> usize {
        self.topology.read().await.subtree_size()
    }
}

#[async_trait]
impl SchedulerFacade for LocalScheduler {
    fn name(&self) -> &str {
        "local"
    }

    async fn register_resource(&self, node: &ResourceTopologyNode) -> Result<(), SchedulerError> {
        let mut topology = self.topology.write().await;

        if topology.find(node.id()).is_some() {
            return Err(SchedulerError::Rejected(format!(
                "resource {} already registered",
                node.id()
            )));
        }

        let Some(parent_id) = node.parent_id() else {
            return Err(SchedulerError::Rejected(format!(
                "resource {} has no parent",
                node.id()
            )));
        };

        let Some(parent) = topology.find_mut(parent_id) else {
            return Err(SchedulerError::Rejected(format!(
                "parent {} of resource {} is not registered",
                parent_id,
                node.id()
            )));
        };

        parent
            .add_child(node.clone())
            .map_err(|e| SchedulerError::Rejected(e.to_string()))?;

        debug!(resource_id = %node.id(), parent_id = %parent_id, "Registered resource");
        Ok(())
    }
}
