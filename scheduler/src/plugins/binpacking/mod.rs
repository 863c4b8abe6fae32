//! Bin-packing policy: consolidate pods onto fewer, busier nodes.
//!
//! One plugin takes part in three extension points:
//!
//! - **queue sort** ([`sort`]) — higher priority first, then bigger pods
//!   first, then earlier arrival
//! - **score** ([`score`]) — nodes running more pods score higher
//! - **normalize** ([`normalize`]) — rescale a pod's scores into
//!   `[0, MAX_NODE_SCORE]`

pub mod normalize;
pub mod score;
pub mod sort;

use std::sync::Arc;

use serde_json::Value;

use crate::error::PluginError;
use crate::framework::{Handle, Plugin, QueueSortPlugin, ScorePlugin};

/// Name the plugin is registered and enabled under.
pub const NAME: &str = "Bin-Packing-Plugin";

/// Weight of one cpu unit in the footprint, so cpu and memory bytes are
/// comparable (1 cpu counts like 1 MiB).
pub const CPU_WEIGHT: i64 = 1024 * 1024;

/// Raw score added per pod already running on a node.
pub const OCCUPANCY_WEIGHT: i64 = 10;

pub struct BinPacking {
    handle: Handle,
}

impl BinPacking {
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

/// Factory for the registry. The bin-packing plugin takes no arguments;
/// anything passed is ignored.
pub fn new(args: Option<&Value>, handle: Handle) -> Result<Arc<dyn Plugin>, PluginError> {
    if args.is_some() {
        tracing::debug!(plugin = NAME, "Ignoring plugin arguments");
    }
    Ok(Arc::new(BinPacking::with_handle(handle)))
}

impl Plugin for BinPacking {
    fn name(&self) -> &str {
        NAME
    }

    fn as_queue_sort(self: Arc<Self>) -> Option<Arc<dyn QueueSortPlugin>> {
        Some(self)
    }

    fn as_score_plugin(self: Arc<Self>) -> Option<Arc<dyn ScorePlugin>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::Snapshot;

    #[test]
    fn test_new_exposes_all_extension_points() {
        let handle = Handle::new(Arc::new(Snapshot::default()));
        let plugin = new(Some(&serde_json::json!({"unused": true})), handle).unwrap();

        assert_eq!(plugin.name(), "Bin-Packing-Plugin");
        assert!(plugin.clone().as_queue_sort().is_some());
        assert!(plugin.as_score_plugin().is_some());
    }

    #[test]
    fn test_tuning_constants() {
        assert_eq!(CPU_WEIGHT, 1_048_576);
        assert_eq!(OCCUPANCY_WEIGHT, 10);
        assert_eq!(crate::framework::MAX_NODE_SCORE, 100);
    }
}
