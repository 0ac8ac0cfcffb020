//! Reconciliation loop primitives.
//!
//! Helpers for poll-driven loops that converge an external system toward what
//! has been observed. Key concepts:
//!
//! - **Observation**: what the inventory reported this cycle.
//! - **Confirmation**: an external side effect (registration, binding) that is
//!   known to have succeeded and must not be repeated.
//! - **Retry accounting**: failures per key, so a loop can tell a blip from a
//!   resource that keeps failing.
//!
//! # Invariants
//!
//! - A confirmation is only dropped when the caller forgets it explicitly
//! - Recording a failure never removes a confirmation

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Record of a side effect that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Free-form detail, e.g. the node a workload was bound to.
    pub detail: String,

    /// When the confirmation was recorded.
    pub confirmed_at: DateTime<Utc>,
}

/// Set of keys whose side effect has been confirmed.
///
/// A key is either absent (not attempted, or attempted and failed) or
/// confirmed. The loop uses absence to decide what to (re)try next cycle.
#[derive(Debug, Clone)]
pub struct ConfirmationLedger<K> {
    entries: BTreeMap<K, Confirmation>,
}

impl<K: Ord + Clone> ConfirmationLedger<K> {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Record a confirmation.
    ///
    /// Returns false if the key was already confirmed; the original record is
    /// kept in that case.
    pub fn confirm(&mut self, key: K, detail: impl Into<String>) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }

        self.entries.insert(
            key,
            Confirmation {
                detail: detail.into(),
                confirmed_at: Utc::now(),
            },
        );
        true
    }

    /// Check whether a key has been confirmed.
    pub fn is_confirmed(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Get the confirmation record for a key.
    pub fn get(&self, key: &K) -> Option<&Confirmation> {
        self.entries.get(key)
    }

    /// Number of confirmed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been confirmed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over confirmed keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Keep only the confirmations for which `keep` returns true.
    ///
    /// Returns the number of confirmations dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        before - self.entries.len()
    }
}

impl<K: Ord + Clone> Default for ConfirmationLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry tracker for failed operations.
#[derive(Debug, Clone)]
pub struct RetryTracker<K> {
    /// Failures tolerated per key before it counts as exhausted.
    max_retries: u32,

    /// Retry window duration.
    window: Duration,

    /// Tracked failures: key -> (count, first_failure_time).
    failures: BTreeMap<K, (u32, Instant)>,
}

impl<K: Ord + Clone> RetryTracker<K> {
    /// Create a new retry tracker.
    pub fn new(max_retries: u32, window: Duration) -> Self {
        Self {
            max_retries,
            window,
            failures: BTreeMap::new(),
        }
    }

    /// Record a failure for a key.
    ///
    /// Returns true if retries are exhausted.
    pub fn record_failure(&mut self, key: &K) -> bool {
        let now = Instant::now();

        let (count, first) = self.failures.entry(key.clone()).or_insert((0, now));

        // Reset if outside window
        if now.duration_since(*first) > self.window {
            *count = 0;
            *first = now;
        }

        *count += 1;
        *count > self.max_retries
    }

    /// Number of failures recorded for a key in the current window.
    pub fn failures(&self, key: &K) -> u32 {
        match self.failures.get(key) {
            Some((count, first)) if first.elapsed() <= self.window => *count,
            _ => 0,
        }
    }

    /// Check if retries are exhausted for a key.
    pub fn is_exhausted(&self, key: &K) -> bool {
        self.failures(key) > self.max_retries
    }

    /// Clear failure tracking for a key (on success).
    pub fn clear(&mut self, key: &K) {
        self.failures.remove(key);
    }

    /// Prune expired entries.
    pub fn prune(&mut self) {
        let now = Instant::now();
        self.failures
            .retain(|_, (_, first)| now.duration_since(*first) <= self.window);
    }

    /// Number of keys with failures on record.
    pub fn tracked(&self) -> usize {
        self.failures.len()
    }
}

impl<K: Ord + Clone> Default for RetryTracker<K> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_WINDOW)
    }
}

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default failures tolerated per key before escalating.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default retry window.
pub const DEFAULT_RETRY_WINDOW: Duration = Duration::from_secs(10 * 60); // 10 minutes
