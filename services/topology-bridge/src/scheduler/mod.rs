//! Scheduler registration interface.
//!
//! The scheduler owns placement and resource state transitions. All the
//! bridge needs from it is to accept each new machine's topology node once.

mod local;
mod remote;

use async_trait::async_trait;
use strata_topology::ResourceTopologyNode;
use thiserror::Error;

pub use local::LocalScheduler;
pub use remote::RemoteScheduler;

/// Errors from the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("scheduler returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registration rejected: {0}")]
    Rejected(String),
}

/// Scheduler as seen by the reconciliation loop.
#[async_trait]
pub trait SchedulerFacade: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Register a newly discovered resource and its subtree.
    async fn register_resource(&self, node: &ResourceTopologyNode) -> Result<(), SchedulerError>;
}
