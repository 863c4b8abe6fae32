use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::metadata::Metadata;
use crate::models::quantity::{Quantity, RESOURCE_CPU, RESOURCE_MEMORY};

// --- Core ---

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: PodSpec,
}

/// Desired state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodSpec {
    /// Empty while the pod waits for placement
    #[serde(default)]
    pub node_name: String,
    /// Scheduling priority, higher is more important. Unset means 0.
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

// --- Containers ---

/// Definition of a container within a Pod.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

/// Resource limits keyed by resource name (`cpu`, `memory`, ...).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub limits: BTreeMap<String, Quantity>,
}

// --- Impl ---

impl Pod {
    /// Declared priority, 0 when `PodSpec::priority` is unset.
    pub fn priority(&self) -> i32 {
        self.spec.priority.unwrap_or(0)
    }

    pub fn is_bound(&self) -> bool {
        !self.spec.node_name.is_empty()
    }
}

impl ContainerSpec {
    pub fn new(name: &str) -> Self {
        ContainerSpec {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder used mostly by tests and manifests assembled in code.
    pub fn with_limit(mut self, resource: &str, quantity: Quantity) -> Self {
        self.resources.limits.insert(resource.to_string(), quantity);
        self
    }

    pub fn cpu_limit(&self) -> Option<&Quantity> {
        self.resources.limits.get(RESOURCE_CPU)
    }

    pub fn memory_limit(&self) -> Option<&Quantity> {
        self.resources.limits.get(RESOURCE_MEMORY)
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerSpec {
            name: "test-container".to_string(),
            image: "busybox:latest".to_string(),
            resources: ResourceRequirements::default(),
        }
    }
}

impl Default for PodSpec {
    fn default() -> Self {
        PodSpec {
            node_name: "".to_string(),
            priority: None,
            containers: vec![ContainerSpec::default()],
        }
    }
}
