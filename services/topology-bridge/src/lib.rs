//! strata topology bridge library
//!
//! Polls a cluster inventory for nodes and workloads, mirrors every new node
//! into a resource topology rooted at a single coordinator, registers each new
//! machine with the scheduler exactly once, and binds unplaced workloads.
//!
//! ## Architecture
//!
//! ```text
//! ClusterInventory ──► Reconciler ──► ReconcileContext (catalog + builder)
//!                         │
//!                         ├──► SchedulerFacade::register_resource
//!                         └──► ClusterInventory::bind_workload (via PlacementPolicy)
//! ```
//!
//! ## Modules
//!
//! - `inventory`: cluster inventory trait and HTTP client
//! - `scheduler`: scheduler registration trait, remote and in-process schedulers
//! - `placement`: workload placement policies
//! - `context`: the state owned by the loop
//! - `reconciler`: the poll loop itself
//! - `testing`: scripted inventory/scheduler doubles for tests

pub mod config;
pub mod context;
pub mod inventory;
pub mod placement;
pub mod reconciler;
pub mod scheduler;
pub mod testing;

// Re-export commonly used types
pub use context::ReconcileContext;
pub use inventory::{
    ClusterInventory, DiscoveredNode, DiscoveredWorkload, InventoryError, WorkloadKey,
};
pub use placement::{FirstAvailable, PlacementPolicy, RoundRobin};
pub use reconciler::{CycleStats, Reconciler, ReconcilerConfig};
pub use scheduler::{LocalScheduler, RemoteScheduler, SchedulerError, SchedulerFacade};
