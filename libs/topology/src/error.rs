//! Error types for topology construction.

use strata_id::ResourceId;
use thiserror::Error;

/// An insert collided with an existing catalog entry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("resource {0} already exists in the catalog")]
pub struct DuplicateResourceError(pub ResourceId);

/// Errors that can occur when building the topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The resource ID is already in the catalog.
    #[error(transparent)]
    Duplicate(#[from] DuplicateResourceError),

    /// The named parent has no catalog entry.
    #[error("parent {parent} of resource {id} is not in the catalog")]
    UnknownParent { id: ResourceId, parent: ResourceId },

    /// A coordinator has already been created.
    #[error("coordinator {0} already exists")]
    CoordinatorExists(ResourceId),

    /// A child was attached to a node it does not name as its parent.
    #[error("resource {child} names parent {expected:?}, not {actual}")]
    ParentMismatch {
        child: ResourceId,
        expected: Option<ResourceId>,
        actual: ResourceId,
    },
}

impl TopologyError {
    /// Returns true if this error is an identity collision.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, TopologyError::Duplicate(_))
    }
}
