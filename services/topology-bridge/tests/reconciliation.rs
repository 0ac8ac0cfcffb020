//! Integration tests for the reconciliation loop.
//!
//! These drive the reconciler against the scripted inventory and scheduler:
//! 1. Nodes become machine resources under the coordinator, once
//! 2. Each machine is registered before any workload is bound to it
//! 3. Unbound workloads are bound once, to a node seen in the same cycle

use std::sync::Arc;
use std::time::Duration;

use strata_bridge::testing::{Call, CallJournal, MockInventory, MockScheduler};
use strata_bridge::{
    DiscoveredNode, DiscoveredWorkload, LocalScheduler, ReconcileContext, Reconciler,
    ReconcilerConfig, RoundRobin,
};
use strata_id::{NodeName, ResourceId, SequentialIdGenerator, WorkloadName};
use strata_topology::{ResourceState, ResourceType};
use tokio::sync::watch;

struct Harness {
    inventory: Arc<MockInventory>,
    scheduler: Arc<MockScheduler>,
    journal: Arc<CallJournal>,
    reconciler: Reconciler,
}

fn harness() -> Harness {
    harness_with(ReconcilerConfig::default())
}

fn harness_with(config: ReconcilerConfig) -> Harness {
    let journal = CallJournal::new();
    let inventory = Arc::new(MockInventory::with_journal(Arc::clone(&journal)));
    let scheduler = Arc::new(MockScheduler::with_journal(Arc::clone(&journal)));
    let context = ReconcileContext::bootstrap(Arc::new(SequentialIdGenerator::default())).unwrap();

    let reconciler = Reconciler::new(
        context,
        Arc::clone(&inventory) as _,
        Arc::clone(&scheduler) as _,
        config,
    );

    Harness {
        inventory,
        scheduler,
        journal,
        reconciler,
    }
}

fn node(name: &str, address: &str) -> DiscoveredNode {
    DiscoveredNode::new(NodeName::parse(name).unwrap(), address)
}

fn workload(name: &str) -> DiscoveredWorkload {
    DiscoveredWorkload::new("default", name).unwrap()
}

fn workload_id(name: &str) -> WorkloadName {
    workload(name).id
}

fn root_id() -> ResourceId {
    SequentialIdGenerator::id_for(1)
}

#[tokio::test]
async fn test_empty_inventory_changes_nothing() {
    let mut h = harness();

    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.nodes_seen, 0);
    assert_eq!(stats.workloads_seen, 0);
    assert_eq!(h.reconciler.catalog().len(), 1);
    assert!(h.reconciler.catalog().coordinator().is_some());
    assert!(h.journal.calls().is_empty());
}

#[tokio::test]
async fn test_new_node_becomes_idle_machine() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);

    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.nodes_created, 1);
    assert_eq!(stats.nodes_registered, 1);

    let catalog = h.reconciler.catalog();
    assert_eq!(catalog.len(), 2);

    let machines: Vec<_> = catalog.machines().collect();
    assert_eq!(machines.len(), 1);
    let machine = machines[0].descriptor();
    assert_eq!(machine.resource_type, ResourceType::Machine);
    assert_eq!(machine.parent_id, Some(root_id()));
    assert_eq!(machine.state, Some(ResourceState::Idle));
    assert_eq!(machine.uuid, ResourceId::derive("n1"));
    assert_eq!(machines[0].endpoint().host, "10.0.0.1");

    assert_eq!(h.scheduler.registered_ids(), vec![ResourceId::derive("n1")]);
    assert!(h.reconciler.is_registered(&ResourceId::derive("n1")));
}

#[tokio::test]
async fn test_known_node_and_new_workload() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.reconciler.reconcile_once().await;

    h.inventory.set_workloads(vec![workload("p1")]);
    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.nodes_created, 0);
    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(h.reconciler.catalog().machines().count(), 1);
    assert_eq!(h.scheduler.registrations().len(), 1);
    assert_eq!(
        h.inventory.bindings(),
        vec![(workload_id("p1"), "n1".to_string())]
    );
    assert_eq!(h.reconciler.bound_target(&workload("p1")), Some("n1"));
}

#[tokio::test]
async fn test_workload_without_nodes_stays_unbound() {
    let mut h = harness();
    h.inventory.set_workloads(vec![workload("p1")]);

    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.workloads_seen, 1);
    assert_eq!(stats.workloads_unplaced, 1);
    assert!(h.inventory.bindings().is_empty());
}

#[tokio::test]
async fn test_discovery_is_idempotent_across_cycles() {
    let mut h = harness();
    h.inventory
        .set_nodes(vec![node("n1", "10.0.0.1"), node("n2", "10.0.0.2")]);

    for _ in 0..5 {
        h.reconciler.reconcile_once().await;
    }

    assert_eq!(h.reconciler.catalog().len(), 3);
    assert_eq!(h.scheduler.registrations().len(), 2);
}

#[tokio::test]
async fn test_workload_bound_once() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.set_workloads(vec![workload("p1")]);

    for _ in 0..3 {
        h.reconciler.reconcile_once().await;
    }

    assert_eq!(h.inventory.bindings().len(), 1);
}

#[tokio::test]
async fn test_registration_precedes_binding() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.set_workloads(vec![workload("p1")]);

    h.reconciler.reconcile_once().await;

    assert_eq!(
        h.journal.calls(),
        vec![
            Call::Registered(ResourceId::derive("n1")),
            Call::Bound {
                workload: workload_id("p1"),
                node: "n1".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_machines_carry_a_processing_unit() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.reconciler.reconcile_once().await;

    let registered = h.scheduler.registrations();
    let machine = &registered[0];
    assert_eq!(machine.children().len(), 1);

    let pu = machine.children()[0].descriptor();
    assert_eq!(pu.resource_type, ResourceType::Pu);
    assert_eq!(pu.parent_id, Some(machine.id()));
    assert_eq!(pu.friendly_name, "n1_PU #0");

    // Processing units live inside the machine's subtree, not the catalog.
    assert!(!h.reconciler.catalog().contains(&pu.uuid));
}

#[tokio::test]
async fn test_every_parent_precedes_its_child() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.reconciler.reconcile_once().await;
    h.inventory.set_nodes(vec![
        node("n1", "10.0.0.1"),
        node("n2", "10.0.0.2"),
        node("n3", "10.0.0.3"),
    ]);
    h.reconciler.reconcile_once().await;

    let catalog = h.reconciler.catalog();
    for (_, status) in catalog.iter() {
        if let Some(parent) = status.descriptor().parent_id {
            let parent = catalog.get(&parent).unwrap();
            assert!(parent.discovered_at() <= status.discovered_at());
            assert_eq!(parent.descriptor().resource_type, ResourceType::Coordinator);
        }
    }
    assert_eq!(catalog.children_of(root_id()).count(), 3);
}

#[tokio::test]
async fn test_failed_registration_is_retried() {
    let mut h = harness();
    h.scheduler.reject_next(1);
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.set_workloads(vec![workload("p1")]);

    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.nodes_created, 1);
    assert_eq!(stats.registration_failures, 1);
    // An unregistered machine is not a placement candidate.
    assert_eq!(stats.workloads_unplaced, 1);
    assert!(h.inventory.bindings().is_empty());
    assert!(!h.reconciler.is_registered(&ResourceId::derive("n1")));

    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.nodes_created, 0);
    assert_eq!(stats.nodes_registered, 1);
    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(h.reconciler.catalog().len(), 2);
}

#[tokio::test]
async fn test_failed_binding_is_retried() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.set_workloads(vec![workload("p1")]);
    h.inventory.fail_bindings(true);

    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.binding_failures, 1);
    assert!(h.reconciler.bound_target(&workload("p1")).is_none());

    h.inventory.fail_bindings(false);
    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(h.inventory.bindings().len(), 1);
}

#[tokio::test]
async fn test_node_listing_failure_skips_placement() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.reconciler.reconcile_once().await;

    h.inventory.fail_node_listing(true);
    h.inventory.set_workloads(vec![workload("p1")]);
    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.inventory_failures, 1);
    assert_eq!(stats.workloads_seen, 1);
    assert!(h.inventory.bindings().is_empty());
    assert_eq!(h.reconciler.catalog().len(), 2);
}

#[tokio::test]
async fn test_workload_listing_failure_keeps_nodes() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.fail_workload_listing(true);

    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.inventory_failures, 1);
    assert_eq!(stats.nodes_registered, 1);
    assert_eq!(h.reconciler.catalog().len(), 2);
}

#[tokio::test]
async fn test_assigned_workloads_are_skipped() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory
        .set_workloads(vec![workload("p1").assigned_to("n1"), workload("p2")]);

    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.workloads_already_bound, 1);
    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(
        h.inventory.bindings(),
        vec![(workload_id("p2"), "n1".to_string())]
    );
}

#[tokio::test]
async fn test_unschedulable_nodes_are_ignored() {
    let mut h = harness();
    let mut cordoned = node("n1", "10.0.0.1");
    cordoned.unschedulable = true;
    let mut down = node("n2", "10.0.0.2");
    down.ready = false;
    h.inventory
        .set_nodes(vec![cordoned, down, node("n3", "10.0.0.3")]);
    h.inventory.set_workloads(vec![workload("p1")]);

    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.nodes_seen, 3);
    assert_eq!(stats.nodes_ignored, 2);
    assert_eq!(h.reconciler.catalog().machines().count(), 1);
    assert_eq!(
        h.inventory.bindings(),
        vec![(workload_id("p1"), "n3".to_string())]
    );
}

#[tokio::test]
async fn test_round_robin_spreads_workloads() {
    let mut h = harness();
    h.reconciler = h
        .reconciler
        .with_placement(Box::new(RoundRobin::default()));
    h.inventory
        .set_nodes(vec![node("n1", "10.0.0.1"), node("n2", "10.0.0.2")]);
    h.inventory
        .set_workloads(vec![workload("p1"), workload("p2")]);

    h.reconciler.reconcile_once().await;

    assert_eq!(
        h.inventory.bindings(),
        vec![
            (workload_id("p1"), "n1".to_string()),
            (workload_id("p2"), "n2".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_recreated_workload_is_bound_again() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    let first = workload("web-0").with_uid("uid-1");

    h.inventory.set_workloads(vec![first.clone()]);
    h.reconciler.reconcile_once().await;
    assert_eq!(h.reconciler.bound_target(&first), Some("n1"));

    // The inventory catches up with the binding.
    h.inventory
        .set_workloads(vec![first.clone().assigned_to("n1")]);
    let stats = h.reconciler.reconcile_once().await;
    assert_eq!(stats.workloads_already_bound, 1);
    assert!(h.reconciler.bound_target(&first).is_none());

    // Deleted, then recreated under the same name.
    h.inventory.set_workloads(vec![]);
    h.reconciler.reconcile_once().await;
    let second = workload("web-0").with_uid("uid-2");
    h.inventory.set_workloads(vec![second.clone()]);
    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(stats.workloads_already_bound, 0);
    assert_eq!(h.inventory.bindings().len(), 2);
    assert_eq!(h.reconciler.bound_target(&second), Some("n1"));
}

#[tokio::test]
async fn test_same_name_with_new_uid_is_a_new_workload() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);

    h.inventory
        .set_workloads(vec![workload("web-0").with_uid("uid-1")]);
    h.reconciler.reconcile_once().await;

    // Replaced between two polls, never seen assigned or absent.
    h.inventory
        .set_workloads(vec![workload("web-0").with_uid("uid-2")]);
    let stats = h.reconciler.reconcile_once().await;

    assert_eq!(stats.workloads_bound, 1);
    assert_eq!(h.inventory.bindings().len(), 2);
}

#[tokio::test]
async fn test_workload_without_uid_rebound_after_absence() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);

    h.inventory.set_workloads(vec![workload("p1")]);
    h.reconciler.reconcile_once().await;
    h.inventory.set_workloads(vec![]);
    h.reconciler.reconcile_once().await;
    h.inventory.set_workloads(vec![workload("p1")]);
    h.reconciler.reconcile_once().await;

    assert_eq!(h.inventory.bindings().len(), 2);
}

#[tokio::test]
async fn test_bound_workloads_kept_when_listing_fails() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);
    h.inventory.set_workloads(vec![workload("p1")]);
    h.reconciler.reconcile_once().await;

    h.inventory.fail_workload_listing(true);
    h.reconciler.reconcile_once().await;
    h.inventory.fail_workload_listing(false);
    h.reconciler.reconcile_once().await;

    assert_eq!(h.inventory.bindings().len(), 1);
}

#[tokio::test]
async fn test_recreated_node_keeps_tree_unique() {
    let context = ReconcileContext::bootstrap(Arc::new(SequentialIdGenerator::default())).unwrap();
    let root = context.root().unwrap().topology_node().clone();
    let scheduler = Arc::new(LocalScheduler::new(root));
    let inventory = Arc::new(MockInventory::new());

    let mut reconciler = Reconciler::new(
        context,
        Arc::clone(&inventory) as _,
        Arc::clone(&scheduler) as _,
        ReconcilerConfig::default(),
    );

    for uid in ["uid-before", "uid-after"] {
        let mut recreated = node(uid, "10.0.0.1");
        recreated.hostname = "worker-1".to_string();
        inventory.set_nodes(vec![recreated]);
        reconciler.reconcile_once().await;
    }

    // coordinator + 2 machines + 2 processing units, all accepted
    assert_eq!(scheduler.resource_count().await, 5);
    let topology = scheduler.topology().await;
    let pu_ids: Vec<_> = topology
        .children()
        .iter()
        .map(|machine| machine.children()[0].id())
        .collect();
    assert_eq!(pu_ids.len(), 2);
    assert_ne!(pu_ids[0], pu_ids[1]);
}

#[tokio::test]
async fn test_local_scheduler_mirrors_catalog() {
    let context = ReconcileContext::bootstrap(Arc::new(SequentialIdGenerator::default())).unwrap();
    let root = context.root().unwrap().topology_node().clone();
    let scheduler = Arc::new(LocalScheduler::new(root));
    let inventory = Arc::new(MockInventory::new());
    inventory.set_nodes(vec![node("n1", "10.0.0.1"), node("n2", "10.0.0.2")]);

    let mut reconciler = Reconciler::new(
        context,
        Arc::clone(&inventory) as _,
        Arc::clone(&scheduler) as _,
        ReconcilerConfig::default(),
    );
    reconciler.reconcile_once().await;
    reconciler.reconcile_once().await;

    // coordinator + 2 machines + 2 processing units
    assert_eq!(scheduler.resource_count().await, 5);
    assert_eq!(scheduler.topology().await.children().len(), 2);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let Harness {
        inventory,
        scheduler,
        mut reconciler,
        ..
    } = harness_with(ReconcilerConfig {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    });
    inventory.set_nodes(vec![node("n1", "10.0.0.1")]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        reconciler.run(shutdown_rx).await;
        reconciler
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    let reconciler = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reconciler did not stop")
        .unwrap();

    assert_eq!(reconciler.catalog().len(), 2);
    assert_eq!(scheduler.registrations().len(), 1);
}

#[tokio::test]
async fn test_run_does_not_start_after_shutdown() {
    let mut h = harness();
    h.inventory.set_nodes(vec![node("n1", "10.0.0.1")]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), h.reconciler.run(shutdown_rx))
        .await
        .expect("reconciler did not stop");

    assert_eq!(h.reconciler.catalog().len(), 1);
    assert!(h.journal.calls().is_empty());
}
