//! Cluster inventory interface.
//!
//! The inventory is the source of truth for which nodes and workloads exist.
//! The bridge only ever lists them and asks for bindings; it never writes
//! anything else back.

mod http;

use async_trait::async_trait;
use strata_id::{IdError, NodeName, WorkloadName};
use strata_topology::{Label, MachineSpec, ResourceCapacity};
use thiserror::Error;

pub use http::{parse_cpu_millicores, parse_memory_kb, HttpInventoryClient};

/// Errors from the cluster inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("inventory returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid inventory object: {0}")]
    Invalid(String),

    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

impl From<IdError> for InventoryError {
    fn from(e: IdError) -> Self {
        InventoryError::Invalid(e.to_string())
    }
}

/// A node as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredNode {
    /// Inventory identifier (UID when available, otherwise the node name).
    pub id: NodeName,
    pub hostname: String,
    /// Address used as the binding target.
    pub address: String,
    pub ready: bool,
    pub unschedulable: bool,
    pub labels: Vec<Label>,
    pub capacity: Option<ResourceCapacity>,
}

impl DiscoveredNode {
    /// A ready, schedulable node whose hostname is its identifier.
    pub fn new(id: NodeName, address: impl Into<String>) -> Self {
        Self {
            hostname: id.to_string(),
            id,
            address: address.into(),
            ready: true,
            unschedulable: false,
            labels: Vec::new(),
            capacity: None,
        }
    }

    /// Nodes that are cordoned or not ready never become machines.
    pub fn is_schedulable(&self) -> bool {
        self.ready && !self.unschedulable
    }

    pub fn machine_spec(&self) -> MachineSpec {
        MachineSpec {
            hostname: self.hostname.clone(),
            address: self.address.clone(),
            labels: self.labels.clone(),
            capacity: self.capacity,
        }
    }
}

/// A workload (pod) as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredWorkload {
    /// `namespace/name`.
    pub id: WorkloadName,
    pub namespace: String,
    pub name: String,
    /// Inventory UID; differs between two pods that reuse the same name.
    pub uid: Option<String>,
    /// Node the inventory already has this workload on, if any.
    pub assigned_node: Option<String>,
}

/// Identity of one workload instance: its name plus the inventory UID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkloadKey {
    pub name: WorkloadName,
    pub uid: Option<String>,
}

impl std::fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.uid {
            Some(uid) => write!(f, "{} ({})", self.name, uid),
            None => write!(f, "{}", self.name),
        }
    }
}

impl DiscoveredWorkload {
    pub fn new(namespace: &str, name: &str) -> Result<Self, IdError> {
        let id = WorkloadName::parse(&format!("{namespace}/{name}"))?;
        Ok(Self {
            id,
            namespace: namespace.to_string(),
            name: name.to_string(),
            uid: None,
            assigned_node: None,
        })
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn key(&self) -> WorkloadKey {
        WorkloadKey {
            name: self.id.clone(),
            uid: self.uid.clone(),
        }
    }

    pub fn assigned_to(mut self, node: impl Into<String>) -> Self {
        self.assigned_node = Some(node.into());
        self
    }
}

/// The cluster inventory as seen by the reconciliation loop.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    /// List all nodes currently known to the cluster.
    async fn list_nodes(&self) -> Result<Vec<DiscoveredNode>, InventoryError>;

    /// List workloads this bridge is responsible for.
    async fn list_workloads(&self) -> Result<Vec<DiscoveredWorkload>, InventoryError>;

    /// Ask the cluster to run `workload` on the node named `node_name`.
    async fn bind_workload(
        &self,
        workload: &DiscoveredWorkload,
        node_name: &str,
    ) -> Result<(), InventoryError>;
}
