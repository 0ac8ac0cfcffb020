//! In-memory resource catalog.

use std::collections::btree_map::{BTreeMap, Entry};

use strata_id::ResourceId;

use crate::descriptor::ResourceType;
use crate::error::DuplicateResourceError;
use crate::node::ResourceStatus;

/// Mapping from resource ID to resource status.
///
/// Append-only: an entry, once inserted, is never replaced or removed.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    entries: BTreeMap<ResourceId, ResourceStatus>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a status under `id` if the key is free.
    pub fn insert(
        &mut self,
        id: ResourceId,
        status: ResourceStatus,
    ) -> Result<&ResourceStatus, DuplicateResourceError> {
        match self.entries.entry(id) {
            Entry::Occupied(_) => Err(DuplicateResourceError(id)),
            Entry::Vacant(slot) => Ok(&*slot.insert(status)),
        }
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResourceStatus> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &ResourceStatus)> {
        self.entries.iter()
    }

    /// The coordinator entry, if one has been created.
    pub fn coordinator(&self) -> Option<&ResourceStatus> {
        self.of_type(ResourceType::Coordinator).next()
    }

    pub fn machines(&self) -> impl Iterator<Item = &ResourceStatus> {
        self.of_type(ResourceType::Machine)
    }

    /// Entries whose descriptor names `parent` as their parent.
    pub fn children_of(&self, parent: ResourceId) -> impl Iterator<Item = &ResourceStatus> {
        self.entries
            .values()
            .filter(move |s| s.descriptor().parent_id == Some(parent))
    }

    fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &ResourceStatus> {
        self.entries
            .values()
            .filter(move |s| s.descriptor().resource_type == resource_type)
    }
}
