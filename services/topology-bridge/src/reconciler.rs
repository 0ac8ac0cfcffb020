//! Reconciliation loop bridging the inventory and the scheduler.
//!
//! Each cycle:
//! 1. Lists nodes; creates and registers any machine not yet in the catalog
//! 2. Lists workloads; binds the unbound ones via the placement policy
//! 3. Sleeps for the poll interval, or stops if shutdown is signaled
//!
//! All registrations of a cycle happen before any binding in that cycle, and
//! cycles never overlap.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use strata_id::ResourceId;
use strata_reconcile::{
    ConfirmationLedger, RetryTracker, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL,
    DEFAULT_RETRY_WINDOW,
};
use strata_topology::{ResourceCatalog, TopologyError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::context::ReconcileContext;
use crate::inventory::{ClusterInventory, DiscoveredNode, DiscoveredWorkload, WorkloadKey};
use crate::placement::{FirstAvailable, PlacementPolicy};
use crate::scheduler::SchedulerFacade;

/// Reconciliation loop configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Pause between cycles.
    pub poll_interval: Duration,

    /// Failures per node or workload before logging escalates to error.
    pub max_retries: u32,

    /// Window over which failures are counted.
    pub retry_window: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_window: DEFAULT_RETRY_WINDOW,
        }
    }
}

/// Counters for one reconciliation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub nodes_seen: u32,
    pub nodes_ignored: u32,
    pub nodes_created: u32,
    pub nodes_registered: u32,
    pub registration_failures: u32,
    pub workloads_seen: u32,
    pub workloads_bound: u32,
    pub workloads_already_bound: u32,
    pub workloads_unplaced: u32,
    pub binding_failures: u32,
    pub inventory_failures: u32,
}

impl CycleStats {
    /// True if the cycle changed anything or hit an error.
    pub fn is_eventful(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_registered > 0
            || self.workloads_bound > 0
            || self.registration_failures > 0
            || self.binding_failures > 0
            || self.inventory_failures > 0
    }
}

/// Reconciler that mirrors the inventory into the topology.
pub struct Reconciler {
    context: ReconcileContext,
    inventory: Arc<dyn ClusterInventory>,
    scheduler: Arc<dyn SchedulerFacade>,
    placement: Box<dyn PlacementPolicy>,

    /// Machines the scheduler has accepted.
    registered: ConfirmationLedger<ResourceId>,

    /// Workloads bound by this process that the inventory still lists as
    /// unassigned, with the target node name.
    bound: ConfirmationLedger<WorkloadKey>,

    registration_retries: RetryTracker<ResourceId>,
    binding_retries: RetryTracker<WorkloadKey>,

    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler using [`FirstAvailable`] placement.
    pub fn new(
        context: ReconcileContext,
        inventory: Arc<dyn ClusterInventory>,
        scheduler: Arc<dyn SchedulerFacade>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            context,
            inventory,
            scheduler,
            placement: Box::new(FirstAvailable),
            registered: ConfirmationLedger::new(),
            bound: ConfirmationLedger::new(),
            registration_retries: RetryTracker::new(config.max_retries, config.retry_window),
            binding_retries: RetryTracker::new(config.max_retries, config.retry_window),
            config,
        }
    }

    /// Replace the placement policy.
    pub fn with_placement(mut self, placement: Box<dyn PlacementPolicy>) -> Self {
        self.placement = placement;
        self
    }

    pub fn context(&self) -> &ReconcileContext {
        &self.context
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        self.context.catalog()
    }

    pub fn is_registered(&self, id: &ResourceId) -> bool {
        self.registered.is_confirmed(id)
    }

    /// Node this process bound the workload to, while the inventory has not
    /// caught up with the binding yet.
    pub fn bound_target(&self, workload: &DiscoveredWorkload) -> Option<&str> {
        self.bound.get(&workload.key()).map(|c| c.detail.as_str())
    }

    /// Run the reconciliation loop until shutdown.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            placement = self.placement.name(),
            scheduler = self.scheduler.name(),
            root_id = %self.context.root_id(),
            "Starting reconciliation loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let stats = self.reconcile_once().await;
            if stats.is_eventful() {
                info!(
                    nodes_seen = stats.nodes_seen,
                    nodes_created = stats.nodes_created,
                    nodes_registered = stats.nodes_registered,
                    registration_failures = stats.registration_failures,
                    workloads_seen = stats.workloads_seen,
                    workloads_bound = stats.workloads_bound,
                    binding_failures = stats.binding_failures,
                    inventory_failures = stats.inventory_failures,
                    "Reconciliation cycle complete"
                );
            } else {
                debug!(
                    nodes_seen = stats.nodes_seen,
                    workloads_seen = stats.workloads_seen,
                    "Reconciliation cycle complete, nothing to do"
                );
            }

            self.registration_retries.prune();
            self.binding_retries.prune();

            if wait_for_next_cycle(&mut shutdown, self.config.poll_interval).await {
                break;
            }
        }

        info!(
            resources = self.context.catalog().len(),
            "Reconciler shutting down"
        );
    }

    /// Perform a single reconciliation cycle.
    pub async fn reconcile_once(&mut self) -> CycleStats {
        let mut stats = CycleStats::default();

        let candidates = self.discover_nodes(&mut stats).await;
        self.place_workloads(&candidates, &mut stats).await;

        stats
    }

    /// Sync nodes into the catalog and scheduler.
    ///
    /// Returns this cycle's placement candidates: schedulable nodes whose
    /// registration is confirmed, in inventory order.
    async fn discover_nodes(&mut self, stats: &mut CycleStats) -> Vec<DiscoveredNode> {
        let nodes = match self.inventory.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Node discovery failed, skipping node phase");
                stats.inventory_failures += 1;
                return Vec::new();
            }
        };

        let mut candidates = Vec::with_capacity(nodes.len());
        for node in nodes {
            stats.nodes_seen += 1;

            if !node.is_schedulable() {
                debug!(
                    node = %node.id,
                    ready = node.ready,
                    unschedulable = node.unschedulable,
                    "Ignoring node that cannot take workloads"
                );
                stats.nodes_ignored += 1;
                continue;
            }

            let rid = match ResourceId::from_external(node.id.as_str()) {
                Ok(rid) => rid,
                Err(e) => {
                    warn!(node = %node.id, error = %e, "Cannot derive resource ID for node");
                    stats.nodes_ignored += 1;
                    continue;
                }
            };

            match self.context.create_machine(rid, &node.machine_spec()) {
                Ok(_) => {
                    info!(
                        resource_id = %rid,
                        node = %node.id,
                        address = %node.address,
                        "Adding new node's resource"
                    );
                    stats.nodes_created += 1;
                }
                // Already catalogued on an earlier cycle.
                Err(TopologyError::Duplicate(_)) => {}
                Err(e) => {
                    error!(node = %node.id, error = %e, "Failed to create node resource");
                    continue;
                }
            }

            if self.registered.is_confirmed(&rid) || self.register(rid, stats).await {
                candidates.push(node);
            }
        }

        candidates
    }

    /// Register a catalog entry with the scheduler. Returns true on success.
    async fn register(&mut self, rid: ResourceId, stats: &mut CycleStats) -> bool {
        let Some(status) = self.context.catalog().get(&rid) else {
            return false;
        };

        match self.scheduler.register_resource(status.topology_node()).await {
            Ok(()) => {
                debug!(resource_id = %rid, "Resource registered with scheduler");
                self.registered
                    .confirm(rid, status.descriptor().friendly_name.clone());
                self.registration_retries.clear(&rid);
                stats.nodes_registered += 1;
                true
            }
            Err(e) => {
                stats.registration_failures += 1;
                if self.registration_retries.record_failure(&rid) {
                    error!(
                        resource_id = %rid,
                        failures = self.registration_retries.failures(&rid),
                        error = %e,
                        "Resource registration keeps failing"
                    );
                } else {
                    warn!(
                        resource_id = %rid,
                        error = %e,
                        "Resource registration failed, will retry next cycle"
                    );
                }
                false
            }
        }
    }

    /// Bind every workload that is not already bound.
    async fn place_workloads(&mut self, candidates: &[DiscoveredNode], stats: &mut CycleStats) {
        let workloads = match self.inventory.list_workloads().await {
            Ok(workloads) => workloads,
            Err(e) => {
                warn!(error = %e, "Workload discovery failed, skipping workload phase");
                stats.inventory_failures += 1;
                return;
            }
        };

        // Once the inventory shows a workload assigned, or stops listing it,
        // its binding is no longer ours to remember.
        let pending: BTreeSet<WorkloadKey> = workloads
            .iter()
            .filter(|w| w.assigned_node.is_none())
            .map(DiscoveredWorkload::key)
            .collect();
        let forgotten = self.bound.retain(|key| pending.contains(key));
        if forgotten > 0 {
            debug!(forgotten, "Dropped bindings the inventory has caught up with");
        }

        for workload in workloads {
            stats.workloads_seen += 1;
            info!(workload = %workload.id, "Observed workload");

            if let Some(node) = &workload.assigned_node {
                debug!(workload = %workload.id, node = %node, "Workload already assigned by the cluster");
                stats.workloads_already_bound += 1;
                continue;
            }

            let key = workload.key();
            if let Some(previous) = self.bound.get(&key) {
                debug!(
                    workload = %key,
                    node = %previous.detail,
                    "Workload already bound by this bridge"
                );
                stats.workloads_already_bound += 1;
                continue;
            }

            let Some(target) = self.placement.select(&workload, candidates) else {
                debug!(workload = %workload.id, "No node available for workload");
                stats.workloads_unplaced += 1;
                continue;
            };

            match self
                .inventory
                .bind_workload(&workload, &target.hostname)
                .await
            {
                Ok(()) => {
                    info!(
                        workload = %workload.id,
                        node = %target.id,
                        address = %target.address,
                        "Bound workload"
                    );
                    self.binding_retries.clear(&key);
                    self.bound.confirm(key, target.hostname.clone());
                    stats.workloads_bound += 1;
                }
                Err(e) => {
                    stats.binding_failures += 1;
                    if self.binding_retries.record_failure(&key) {
                        error!(
                            workload = %workload.id,
                            failures = self.binding_retries.failures(&key),
                            error = %e,
                            "Workload binding keeps failing"
                        );
                    } else {
                        warn!(
                            workload = %workload.id,
                            error = %e,
                            "Workload binding failed, will retry next cycle"
                        );
                    }
                }
            }
        }
    }
}

/// Sleep for `interval`. Returns true if shutdown was signaled first.
async fn wait_for_next_cycle(shutdown: &mut watch::Receiver<bool>, interval: Duration) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => {
                // A dropped sender can never signal again; treat it as shutdown.
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}
