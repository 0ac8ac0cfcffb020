//! # strata-topology
//!
//! The resource tree the bridge hands to the scheduler.
//!
//! ```text
//! COORDINATOR (random id, localhost:0)
//! ├── MACHINE n1 (id from inventory, <address>:0)
//! │   └── PU "n1_PU #0"
//! └── MACHINE n2
//!     └── PU "n2_PU #0"
//! ```
//!
//! Machines are catalog entries; their PU children live only inside the
//! machine's topology node. Parent links are by ID (`parent_id` on the child),
//! so the catalog never holds two copies of the same subtree.

mod builder;
mod catalog;
mod descriptor;
mod error;
mod node;

pub use builder::{MachineSpec, TopologyBuilder, COORDINATOR_HOST};
pub use catalog::ResourceCatalog;
pub use descriptor::{Label, ResourceCapacity, ResourceDescriptor, ResourceState, ResourceType};
pub use error::{DuplicateResourceError, TopologyError};
pub use node::{Endpoint, ResourceStatus, ResourceTopologyNode};
