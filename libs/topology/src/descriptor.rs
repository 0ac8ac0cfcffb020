//! Resource descriptors.

use serde::{Deserialize, Serialize};
use strata_id::ResourceId;

/// Kind of resource in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Root of the tree, one per process.
    Coordinator,
    /// A cluster node.
    Machine,
    /// A processing unit inside a machine.
    Pu,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceType::Coordinator => "coordinator",
            ResourceType::Machine => "machine",
            ResourceType::Pu => "pu",
        };
        f.write_str(s)
    }
}

/// Scheduling state of a resource.
///
/// Only `Idle` is ever assigned here; other transitions belong to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    Unknown,
    Idle,
    Busy,
    Lost,
}

/// A key/value label copied from the inventory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Capacity reported for a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCapacity {
    /// CPU in millicores.
    pub cpu_millicores: u64,

    /// Memory in KiB.
    pub memory_kb: u64,
}

/// Semantic record describing one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub uuid: ResourceId,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Absent for the coordinator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceState>,

    /// Containing resource; absent only for the coordinator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub friendly_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<ResourceCapacity>,
}

impl ResourceDescriptor {
    /// Descriptor for the root coordinator.
    pub fn coordinator(uuid: ResourceId) -> Self {
        Self {
            uuid,
            resource_type: ResourceType::Coordinator,
            state: None,
            parent_id: None,
            friendly_name: String::new(),
            labels: Vec::new(),
            capacity: None,
        }
    }

    /// Descriptor for an idle leaf or machine under `parent_id`.
    pub fn idle(uuid: ResourceId, resource_type: ResourceType, parent_id: ResourceId) -> Self {
        Self {
            uuid,
            resource_type,
            state: Some(ResourceState::Idle),
            parent_id: Some(parent_id),
            friendly_name: String::new(),
            labels: Vec::new(),
            capacity: None,
        }
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = name.into();
        self
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_capacity(mut self, capacity: Option<ResourceCapacity>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns true for the coordinator.
    pub fn is_root(&self) -> bool {
        self.resource_type == ResourceType::Coordinator
    }
}
