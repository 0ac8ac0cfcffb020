//! Configuration for the topology bridge.
//!
//! Every flag has an environment fallback so the bridge can run from a plain
//! container spec without arguments.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use strata_reconcile::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_WINDOW};

use crate::placement::{FirstAvailable, PlacementPolicy, RoundRobin};
use crate::reconciler::ReconcilerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Placement policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlacementKind {
    FirstAvailable,
    RoundRobin,
}

impl PlacementKind {
    pub fn build(self) -> Box<dyn PlacementPolicy> {
        match self {
            PlacementKind::FirstAvailable => Box::new(FirstAvailable),
            PlacementKind::RoundRobin => Box::new(RoundRobin::default()),
        }
    }
}

/// Topology bridge configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "topology-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Listen address/URI.
    ///
    /// Accepted for compatibility with older deployments; nothing binds to it.
    #[arg(long, env = "STRATA_LISTEN_URI")]
    pub listen_uri: Option<String>,

    /// Base URL of the cluster inventory API.
    #[arg(long, env = "STRATA_INVENTORY_URL", default_value = "http://127.0.0.1:8001")]
    pub inventory_url: String,

    /// Bearer token for the cluster inventory API.
    #[arg(long, env = "STRATA_INVENTORY_TOKEN", hide_env_values = true)]
    pub inventory_token: Option<String>,

    /// Only consider workloads that request this scheduler by name.
    #[arg(long, env = "STRATA_SCHEDULER_NAME")]
    pub scheduler_name: Option<String>,

    /// Base URL of a remote scheduler. Without it, an in-process scheduler is used.
    #[arg(long, env = "STRATA_SCHEDULER_URL")]
    pub scheduler_url: Option<String>,

    /// Seconds between reconciliation cycles.
    #[arg(
        long,
        env = "STRATA_POLL_INTERVAL",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// Timeout for each request to the inventory or scheduler, in seconds.
    #[arg(
        long,
        env = "STRATA_REQUEST_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_secs: u64,

    /// Failures tolerated per node or workload before errors escalate.
    #[arg(long, env = "STRATA_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Workload placement policy.
    #[arg(long, env = "STRATA_PLACEMENT", value_enum, default_value_t = PlacementKind::FirstAvailable)]
    pub placement: PlacementKind,

    /// Log output format.
    #[arg(long, env = "STRATA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: self.poll_interval(),
            max_retries: self.max_retries,
            retry_window: DEFAULT_RETRY_WINDOW,
        }
    }
}
