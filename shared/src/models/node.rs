use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a node in the cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub addr: String,
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_heartbeat: DateTime<Utc>,
}

/// Status of a node in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum NodeStatus {
    #[default]
    Ready,
    Running,
    Stopped,
}

impl NodeStatus {
    /// Whether new pods may be placed on a node in this state.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, NodeStatus::Ready | NodeStatus::Running)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Ready => write!(f, "Ready"),
            NodeStatus::Running => write!(f, "Running"),
            NodeStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

impl Node {
    pub fn named(name: &str) -> Self {
        let now = Utc::now();
        Node {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: NodeStatus::Ready,
            addr: String::new(),
            started_at: now,
            last_heartbeat: now,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::named(&format!("node-{}", Uuid::new_v4()))
    }
}
