//! Workload placement policies.
//!
//! A policy only picks a target among the nodes seen in the current cycle.
//! It does not score fit or reserve capacity; that is the scheduler's job.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::inventory::{DiscoveredNode, DiscoveredWorkload};

/// Chooses where an unbound workload goes.
pub trait PlacementPolicy: Send + Sync {
    /// Name for logs and configuration.
    fn name(&self) -> &'static str;

    /// Pick a node from `candidates`, or `None` to leave the workload unbound.
    fn select<'a>(
        &self,
        workload: &DiscoveredWorkload,
        candidates: &'a [DiscoveredNode],
    ) -> Option<&'a DiscoveredNode>;
}

/// Always the first candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstAvailable;

impl PlacementPolicy for FirstAvailable {
    fn name(&self) -> &'static str {
        "first-available"
    }

    fn select<'a>(
        &self,
        _workload: &DiscoveredWorkload,
        candidates: &'a [DiscoveredNode],
    ) -> Option<&'a DiscoveredNode> {
        candidates.first()
    }
}

/// Rotates through candidates across calls.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl PlacementPolicy for RoundRobin {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn select<'a>(
        &self,
        _workload: &DiscoveredWorkload,
        candidates: &'a [DiscoveredNode],
    ) -> Option<&'a DiscoveredNode> {
        if candidates.is_empty() {
            return None;
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        candidates.get(i % candidates.len())
    }
}

#[cfg(test)]
mod tests {
    use strata_id::NodeName;

    use super::*;

    fn nodes(names: &[&str]) -> Vec<DiscoveredNode> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| DiscoveredNode::new(NodeName::parse(n).unwrap(), format!("10.0.0.{}", i + 1)))
            .collect()
    }

    fn workload() -> DiscoveredWorkload {
        DiscoveredWorkload::new("default", "p1").unwrap()
    }

    #[test]
    fn test_first_available() {
        let candidates = nodes(&["n1", "n2"]);
        let chosen = FirstAvailable.select(&workload(), &candidates).unwrap();
        assert_eq!(chosen.address, "10.0.0.1");

        assert!(FirstAvailable.select(&workload(), &[]).is_none());
    }

    #[test]
    fn test_round_robin_rotates() {
        let policy = RoundRobin::default();
        let candidates = nodes(&["n1", "n2"]);
        let w = workload();

        let picks: Vec<_> = (0..4)
            .map(|_| policy.select(&w, &candidates).unwrap().address.clone())
            .collect();
        assert_eq!(picks, vec!["10.0.0.1", "10.0.0.2", "10.0.0.1", "10.0.0.2"]);
        assert!(policy.select(&w, &[]).is_none());
    }
}
