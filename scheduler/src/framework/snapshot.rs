//! Point-in-time view of the cluster.
//!
//! A [`Snapshot`] is immutable once built, so any number of scoring calls
//! can read it at once. [`ClusterState`] is the provider the plugins hold
//! on to; the host swaps in a fresh snapshot between scheduling cycles.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use shared::models::{Node, Pod};

use super::interface::CycleContext;
use crate::error::LookupError;

/// A node and the pods currently bound to it.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node: Node,
    pub pods: Vec<Pod>,
}

impl NodeInfo {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            pods: Vec::new(),
        }
    }

    /// Number of pods bound to the node.
    pub fn occupancy(&self) -> usize {
        self.pods.len()
    }
}

/// Read access to node information.
pub trait SnapshotLister: Send + Sync {
    fn node_info(&self, ctx: &CycleContext, name: &str) -> Result<Arc<NodeInfo>, LookupError>;

    /// Every node, sorted by name.
    fn list(&self) -> Vec<Arc<NodeInfo>>;
}

#[derive(Debug, Default)]
pub struct Snapshot {
    nodes: HashMap<String, Arc<NodeInfo>>,
}

impl Snapshot {
    /// Build a snapshot from nodes and the pods bound to them.
    /// Pods without a node, or bound to an unknown node, are ignored.
    pub fn new(nodes: &[Node], pods: &[Pod]) -> Self {
        let mut infos: HashMap<String, NodeInfo> = nodes
            .iter()
            .map(|node| (node.name.clone(), NodeInfo::new(node.clone())))
            .collect();

        for pod in pods.iter().filter(|p| p.is_bound()) {
            match infos.get_mut(&pod.spec.node_name) {
                Some(info) => info.pods.push(pod.clone()),
                None => tracing::debug!(
                    pod=%pod.metadata.name,
                    node=%pod.spec.node_name,
                    "Pod bound to unknown node"
                ),
            }
        }

        Self {
            nodes: infos
                .into_iter()
                .map(|(name, info)| (name, Arc::new(info)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SnapshotLister for Snapshot {
    fn node_info(&self, ctx: &CycleContext, name: &str) -> Result<Arc<NodeInfo>, LookupError> {
        if ctx.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    fn list(&self) -> Vec<Arc<NodeInfo>> {
        let mut nodes: Vec<_> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.node.name.cmp(&b.node.name));
        nodes
    }
}

/// Holds the snapshot of the current scheduling cycle.
#[derive(Debug, Default)]
pub struct ClusterState {
    current: RwLock<Arc<Snapshot>>,
}

impl ClusterState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Replace the snapshot. Only the host calls this, between cycles.
    pub fn update(&self, snapshot: Snapshot) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(snapshot);
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SnapshotLister for ClusterState {
    fn node_info(&self, ctx: &CycleContext, name: &str) -> Result<Arc<NodeInfo>, LookupError> {
        self.snapshot().node_info(ctx, name)
    }

    fn list(&self) -> Vec<Arc<NodeInfo>> {
        self.snapshot().list()
    }
}
