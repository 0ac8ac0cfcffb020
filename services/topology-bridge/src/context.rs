//! State owned by the reconciliation loop.

use std::sync::Arc;

use strata_id::{IdentityGenerator, ResourceId};
use strata_topology::{
    MachineSpec, ResourceCatalog, ResourceStatus, TopologyBuilder, TopologyError,
};

/// Catalog, builder, and the coordinator's ID.
///
/// Created once at startup and then owned by the [`Reconciler`](crate::Reconciler).
pub struct ReconcileContext {
    catalog: ResourceCatalog,
    builder: TopologyBuilder,
    root_id: ResourceId,
}

impl ReconcileContext {
    /// Build an empty catalog and create the coordinator in it.
    pub fn bootstrap(generator: Arc<dyn IdentityGenerator>) -> Result<Self, TopologyError> {
        let builder = TopologyBuilder::new(generator);
        let mut catalog = ResourceCatalog::new();
        let root_id = builder.create_top_level_resource(&mut catalog)?.id();

        Ok(Self {
            catalog,
            builder,
            root_id,
        })
    }

    pub fn root_id(&self) -> ResourceId {
        self.root_id
    }

    pub fn root(&self) -> Option<&ResourceStatus> {
        self.catalog.get(&self.root_id)
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Create a machine under the coordinator.
    pub fn create_machine(
        &mut self,
        node_id: ResourceId,
        spec: &MachineSpec,
    ) -> Result<&ResourceStatus, TopologyError> {
        self.builder
            .create_resource_for_node(&mut self.catalog, node_id, self.root_id, spec)
    }
}
