//! Topology tree nodes and per-resource status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_id::ResourceId;

use crate::descriptor::ResourceDescriptor;
use crate::error::TopologyError;

/// A node in the resource tree: a descriptor plus its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTopologyNode {
    pub resource_desc: ResourceDescriptor,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceTopologyNode>,
}

impl ResourceTopologyNode {
    pub fn new(resource_desc: ResourceDescriptor) -> Self {
        Self {
            resource_desc,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.resource_desc.uuid
    }

    pub fn parent_id(&self) -> Option<ResourceId> {
        self.resource_desc.parent_id
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.resource_desc
    }

    pub fn children(&self) -> &[ResourceTopologyNode] {
        &self.children
    }

    /// Append a child. The child must already name this node as its parent.
    pub fn add_child(&mut self, child: ResourceTopologyNode) -> Result<(), TopologyError> {
        if child.parent_id() != Some(self.id()) {
            return Err(TopologyError::ParentMismatch {
                child: child.id(),
                expected: child.parent_id(),
                actual: self.id(),
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_size).sum::<usize>()
    }

    /// Depth-first search for a node by ID.
    pub fn find(&self, id: ResourceId) -> Option<&ResourceTopologyNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: ResourceId) -> Option<&mut ResourceTopologyNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }
}

/// Network endpoint used to reach a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Everything the catalog knows about one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    topology_node: ResourceTopologyNode,
    endpoint: Endpoint,
    discovered_at: DateTime<Utc>,
}

impl ResourceStatus {
    pub fn new(topology_node: ResourceTopologyNode, endpoint: Endpoint) -> Self {
        Self {
            topology_node,
            endpoint,
            discovered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.topology_node.id()
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        self.topology_node.descriptor()
    }

    pub fn topology_node(&self) -> &ResourceTopologyNode {
        &self.topology_node
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }
}
