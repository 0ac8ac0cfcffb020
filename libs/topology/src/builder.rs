//! Construction of coordinator and machine resources.

use std::sync::Arc;

use strata_id::{IdentityGenerator, ResourceId};
use tracing::debug;

use crate::catalog::ResourceCatalog;
use crate::descriptor::{Label, ResourceCapacity, ResourceDescriptor, ResourceType};
use crate::error::TopologyError;
use crate::node::{Endpoint, ResourceStatus, ResourceTopologyNode};

/// Host recorded for the coordinator's endpoint.
pub const COORDINATOR_HOST: &str = "localhost";

/// What the inventory told us about a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineSpec {
    pub hostname: String,
    pub address: String,
    pub labels: Vec<Label>,
    pub capacity: Option<ResourceCapacity>,
}

impl MachineSpec {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Friendly name of the machine's single processing unit.
    pub fn pu_name(&self) -> String {
        format!("{}_PU #0", self.hostname)
    }
}

/// Builds topology nodes and records them in a [`ResourceCatalog`].
pub struct TopologyBuilder {
    generator: Arc<dyn IdentityGenerator>,
}

impl TopologyBuilder {
    pub fn new(generator: Arc<dyn IdentityGenerator>) -> Self {
        Self { generator }
    }

    /// Create the root coordinator under a freshly generated ID.
    ///
    /// Fails if the catalog already has a coordinator.
    pub fn create_top_level_resource<'c>(
        &self,
        catalog: &'c mut ResourceCatalog,
    ) -> Result<&'c ResourceStatus, TopologyError> {
        if let Some(existing) = catalog.coordinator() {
            return Err(TopologyError::CoordinatorExists(existing.id()));
        }

        let id = self.generator.generate();
        let node = ResourceTopologyNode::new(ResourceDescriptor::coordinator(id));
        let status = ResourceStatus::new(node, Endpoint::new(COORDINATOR_HOST, 0));

        debug!(resource_id = %id, "Created coordinator resource");
        Ok(catalog.insert(id, status)?)
    }

    /// Create an idle machine resource under `parent_id`, keyed by `node_id`.
    ///
    /// The machine gets one PU child carrying the same labels and capacity.
    /// The PU ID is derived from the machine ID, so a node recreated under the
    /// same hostname gets a fresh PU as well.
    pub fn create_resource_for_node<'c>(
        &self,
        catalog: &'c mut ResourceCatalog,
        node_id: ResourceId,
        parent_id: ResourceId,
        spec: &MachineSpec,
    ) -> Result<&'c ResourceStatus, TopologyError> {
        if catalog.contains(&node_id) {
            return Err(TopologyError::Duplicate(
                crate::error::DuplicateResourceError(node_id),
            ));
        }
        if !catalog.contains(&parent_id) {
            return Err(TopologyError::UnknownParent {
                id: node_id,
                parent: parent_id,
            });
        }

        let mut machine = ResourceTopologyNode::new(
            ResourceDescriptor::idle(node_id, ResourceType::Machine, parent_id)
                .with_friendly_name(spec.hostname.clone())
                .with_labels(spec.labels.clone())
                .with_capacity(spec.capacity),
        );

        let pu_name = spec.pu_name();
        let pu = ResourceTopologyNode::new(
            ResourceDescriptor::idle(pu_id(node_id, &pu_name), ResourceType::Pu, node_id)
                .with_friendly_name(pu_name)
                .with_labels(spec.labels.clone())
                .with_capacity(spec.capacity),
        );
        machine.add_child(pu)?;

        let status = ResourceStatus::new(machine, Endpoint::new(spec.address.clone(), 0));

        debug!(
            resource_id = %node_id,
            parent_id = %parent_id,
            hostname = %spec.hostname,
            "Created machine resource"
        );
        Ok(catalog.insert(node_id, status)?)
    }
}

fn pu_id(machine: ResourceId, pu_name: &str) -> ResourceId {
    ResourceId::derive(&format!("{machine}/{pu_name}"))
}
