//! HTTP client for a Kubernetes-shaped inventory API.
//!
//! Only the three calls the loop needs are implemented:
//! - `GET  /api/v1/nodes`
//! - `GET  /api/v1/pods`
//! - `POST /api/v1/namespaces/{ns}/pods/{name}/binding`

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strata_id::NodeName;
use strata_topology::{Label, ResourceCapacity};
use tracing::{debug, error, warn};

use super::{ClusterInventory, DiscoveredNode, DiscoveredWorkload, InventoryError};
use crate::config::Config;

/// Inventory API client.
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    scheduler_name: Option<String>,
}

impl HttpInventoryClient {
    /// Create a client for the inventory at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            scheduler_name: None,
        })
    }

    /// Create a client from the bridge configuration.
    pub fn from_config(config: &Config) -> Result<Self, InventoryError> {
        let mut client = Self::new(&config.inventory_url, config.request_timeout())?;
        client.token = config.inventory_token.clone();
        client.scheduler_name = config.scheduler_name.clone();
        Ok(client)
    }

    /// Only list workloads whose `schedulerName` matches.
    pub fn with_scheduler_name(mut self, name: impl Into<String>) -> Self {
        self.scheduler_name = Some(name.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, InventoryError> {
        debug!(path, "Querying inventory");
        let response = self.request(reqwest::Method::GET, path).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, path, "Inventory query failed");
            return Err(InventoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    fn wants(&self, pod: &PodObject) -> bool {
        match &self.scheduler_name {
            Some(name) => pod.spec.scheduler_name.as_deref() == Some(name.as_str()),
            None => true,
        }
    }
}

#[async_trait]
impl ClusterInventory for HttpInventoryClient {
    async fn list_nodes(&self) -> Result<Vec<DiscoveredNode>, InventoryError> {
        let list: ObjectList<NodeObject> = self.get_json("/api/v1/nodes").await?;

        let mut nodes = Vec::with_capacity(list.items.len());
        for item in list.items {
            match item.into_discovered() {
                Ok(node) => nodes.push(node),
                Err(e) => warn!(error = %e, "Skipping malformed node"),
            }
        }

        debug!(node_count = nodes.len(), "Listed nodes");
        Ok(nodes)
    }

    async fn list_workloads(&self) -> Result<Vec<DiscoveredWorkload>, InventoryError> {
        let list: ObjectList<PodObject> = self.get_json("/api/v1/pods").await?;

        let mut workloads = Vec::new();
        for pod in list.items {
            if pod.is_finished() || !self.wants(&pod) {
                continue;
            }
            match pod.into_discovered() {
                Ok(workload) => workloads.push(workload),
                Err(e) => warn!(error = %e, "Skipping malformed pod"),
            }
        }

        debug!(workload_count = workloads.len(), "Listed workloads");
        Ok(workloads)
    }

    async fn bind_workload(
        &self,
        workload: &DiscoveredWorkload,
        node_name: &str,
    ) -> Result<(), InventoryError> {
        let path = format!(
            "/api/v1/namespaces/{}/pods/{}/binding",
            workload.namespace, workload.name
        );
        let body = Binding::new(workload, node_name);
        debug!(workload = %workload.id, node = node_name, "Binding workload");

        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, workload = %workload.id, "Binding rejected");
            return Err(InventoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NodeObject {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: NodeSpec,
    #[serde(default)]
    status: NodeStatus,
}

#[derive(Debug, Default, Deserialize)]
struct NodeSpec {
    #[serde(default)]
    unschedulable: bool,
}

#[derive(Debug, Default, Deserialize)]
struct NodeStatus {
    #[serde(default)]
    addresses: Vec<NodeAddress>,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    capacity: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NodeAddress {
    #[serde(rename = "type")]
    kind: String,
    address: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

impl NodeObject {
    /// Ready unless a `Ready` condition says otherwise or the disk is full.
    fn is_ready(&self) -> bool {
        let mut ready = true;
        for cond in &self.status.conditions {
            match cond.kind.as_str() {
                "Ready" => ready = ready && cond.status == "True",
                "OutOfDisk" => ready = ready && cond.status != "True",
                _ => {}
            }
        }
        ready
    }

    fn into_discovered(self) -> Result<DiscoveredNode, InventoryError> {
        let ready = self.is_ready();
        let external = match self.metadata.uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid,
            _ => self.metadata.name.as_str(),
        };
        let id = NodeName::parse(external)?;

        let address = self
            .status
            .addresses
            .iter()
            .find(|a| a.kind == "InternalIP")
            .map(|a| a.address.clone())
            .unwrap_or_else(|| self.metadata.name.clone());

        let cpu = self
            .status
            .capacity
            .get("cpu")
            .map(String::as_str)
            .and_then(parse_cpu_millicores);
        let memory = self
            .status
            .capacity
            .get("memory")
            .map(String::as_str)
            .and_then(parse_memory_kb);
        let capacity = match (cpu, memory) {
            (None, None) => None,
            (cpu, memory) => Some(ResourceCapacity {
                cpu_millicores: cpu.unwrap_or_default(),
                memory_kb: memory.unwrap_or_default(),
            }),
        };

        let labels = self
            .metadata
            .labels
            .into_iter()
            .map(|(k, v)| Label::new(k, v))
            .collect();

        Ok(DiscoveredNode {
            id,
            hostname: self.metadata.name,
            address,
            ready,
            unschedulable: self.spec.unschedulable,
            labels,
            capacity,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PodObject {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: PodSpec,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    node_name: Option<String>,
    #[serde(default)]
    scheduler_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
}

impl PodObject {
    fn is_finished(&self) -> bool {
        matches!(
            self.status.phase.as_deref(),
            Some("Succeeded") | Some("Failed")
        )
    }

    fn into_discovered(self) -> Result<DiscoveredWorkload, InventoryError> {
        let namespace = self.metadata.namespace.as_deref().unwrap_or("default");
        let mut workload = DiscoveredWorkload::new(namespace, &self.metadata.name)?;
        if let Some(uid) = self.metadata.uid.filter(|uid| !uid.is_empty()) {
            workload = workload.with_uid(uid);
        }

        Ok(match self.spec.node_name {
            Some(node) if !node.is_empty() => workload.assigned_to(node),
            _ => workload,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Binding<'a> {
    api_version: &'static str,
    kind: &'static str,
    metadata: BindingMeta<'a>,
    target: BindingTarget<'a>,
}

#[derive(Debug, Serialize)]
struct BindingMeta<'a> {
    name: &'a str,
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BindingTarget<'a> {
    api_version: &'static str,
    kind: &'static str,
    name: &'a str,
}

impl<'a> Binding<'a> {
    fn new(workload: &'a DiscoveredWorkload, node_name: &'a str) -> Self {
        Self {
            api_version: "v1",
            kind: "Binding",
            metadata: BindingMeta {
                name: &workload.name,
                namespace: &workload.namespace,
            },
            target: BindingTarget {
                api_version: "v1",
                kind: "Node",
                name: node_name,
            },
        }
    }
}

// =============================================================================
// Quantities
// =============================================================================

/// Parse a CPU quantity ("4", "0.5", "3500m") into millicores.
pub fn parse_cpu_millicores(quantity: &str) -> Option<u64> {
    let q = quantity.trim();
    if let Some(millis) = q.strip_suffix('m') {
        return millis.parse().ok();
    }
    let cores: f64 = q.parse().ok()?;
    if !cores.is_finite() || cores < 0.0 {
        return None;
    }
    Some((cores * 1000.0).round() as u64)
}

/// Parse a memory quantity ("8Gi", "16384Ki", "1G", "1048576") into KiB.
pub fn parse_memory_kb(quantity: &str) -> Option<u64> {
    const SUFFIXES: [(&str, u64); 8] = [
        ("Ki", 1 << 10),
        ("Mi", 1 << 20),
        ("Gi", 1 << 30),
        ("Ti", 1 << 40),
        ("K", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
    ];

    let q = quantity.trim();
    let (digits, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, mult)| q.strip_suffix(suffix).map(|d| (d, *mult)))
        .unwrap_or((q, 1));

    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier).map(|bytes| bytes / 1024)
}
