//! Scripted inventory and scheduler doubles.
//!
//! Both can share a [`CallJournal`] so tests can check the order in which
//! registrations and bindings happened.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use strata_id::{ResourceId, WorkloadName};
use strata_topology::ResourceTopologyNode;
use tracing::info;

use crate::inventory::{ClusterInventory, DiscoveredNode, DiscoveredWorkload, InventoryError};
use crate::scheduler::{SchedulerError, SchedulerFacade};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// An outward call made by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Registered(ResourceId),
    Bound {
        workload: WorkloadName,
        node: String,
    },
}

/// Ordered record of calls across doubles.
#[derive(Debug, Default)]
pub struct CallJournal {
    calls: Mutex<Vec<Call>>,
}

impl CallJournal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }
}

#[derive(Default)]
struct InventoryState {
    nodes: Vec<DiscoveredNode>,
    workloads: Vec<DiscoveredWorkload>,
    fail_nodes: bool,
    fail_workloads: bool,
    fail_bindings: bool,
    bindings: Vec<(WorkloadName, String)>,
}

/// Inventory serving whatever the test last set.
///
/// Bindings are recorded but do not change the listed workloads, so the
/// reconciler's own bookkeeping is what prevents a second binding.
#[derive(Default)]
pub struct MockInventory {
    state: Mutex<InventoryState>,
    journal: Option<Arc<CallJournal>>,
}

impl MockInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Arc<CallJournal>) -> Self {
        Self {
            state: Mutex::default(),
            journal: Some(journal),
        }
    }

    pub fn set_nodes(&self, nodes: Vec<DiscoveredNode>) {
        lock(&self.state).nodes = nodes;
    }

    pub fn set_workloads(&self, workloads: Vec<DiscoveredWorkload>) {
        lock(&self.state).workloads = workloads;
    }

    pub fn fail_node_listing(&self, fail: bool) {
        lock(&self.state).fail_nodes = fail;
    }

    pub fn fail_workload_listing(&self, fail: bool) {
        lock(&self.state).fail_workloads = fail;
    }

    pub fn fail_bindings(&self, fail: bool) {
        lock(&self.state).fail_bindings = fail;
    }

    /// Successful bindings as (workload, node name), in order.
    pub fn bindings(&self) -> Vec<(WorkloadName, String)> {
        lock(&self.state).bindings.clone()
    }
}

#[async_trait]
impl ClusterInventory for MockInventory {
    async fn list_nodes(&self) -> Result<Vec<DiscoveredNode>, InventoryError> {
        let state = lock(&self.state);
        if state.fail_nodes {
            return Err(InventoryError::Unavailable("node listing disabled".into()));
        }
        Ok(state.nodes.clone())
    }

    async fn list_workloads(&self) -> Result<Vec<DiscoveredWorkload>, InventoryError> {
        let state = lock(&self.state);
        if state.fail_workloads {
            return Err(InventoryError::Unavailable("workload listing disabled".into()));
        }
        Ok(state.workloads.clone())
    }

    async fn bind_workload(
        &self,
        workload: &DiscoveredWorkload,
        node_name: &str,
    ) -> Result<(), InventoryError> {
        let mut state = lock(&self.state);
        if state.fail_bindings {
            return Err(InventoryError::Unavailable("binding disabled".into()));
        }

        info!(workload = %workload.id, node = %node_name, "[MOCK] Binding workload");
        state.bindings.push((workload.id.clone(), node_name.to_string()));
        if let Some(journal) = &self.journal {
            journal.record(Call::Bound {
                workload: workload.id.clone(),
                node: node_name.to_string(),
            });
        }
        Ok(())
    }
}

/// Scheduler that accepts everything unless told to reject.
#[derive(Default)]
pub struct MockScheduler {
    reject_next: AtomicU32,
    registrations: Mutex<Vec<ResourceTopologyNode>>,
    journal: Option<Arc<CallJournal>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Arc<CallJournal>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Reject the next `count` registrations.
    pub fn reject_next(&self, count: u32) {
        self.reject_next.store(count, Ordering::SeqCst);
    }

    /// Accepted registrations, in order.
    pub fn registrations(&self) -> Vec<ResourceTopologyNode> {
        lock(&self.registrations).clone()
    }

    pub fn registered_ids(&self) -> Vec<ResourceId> {
        lock(&self.registrations).iter().map(|n| n.id()).collect()
    }
}

#[async_trait]
impl SchedulerFacade for MockScheduler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn register_resource(&self, node: &ResourceTopologyNode) -> Result<(), SchedulerError> {
        let rejected = self
            .reject_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(SchedulerError::Rejected("mock scheduler configured to reject".into()));
        }

        info!(resource_id = %node.id(), "[MOCK] Registering resource");
        lock(&self.registrations).push(node.clone());
        if let Some(journal) = &self.journal {
            journal.record(Call::Registered(node.id()));
        }
        Ok(())
    }
}
