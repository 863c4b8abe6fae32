//! Host side of the scheduling policy.
//!
//! - **`interface`** — plugin traits and the types passed through them
//! - **`snapshot`** — read-only cluster view the plugins score against
//! - **`registry`** — plugin name to factory mapping
//! - **`queue`** — pending pods ordered by the queue sort plugin
//! - **`runtime`** — one scheduling cycle: filter, score, normalize, select

pub mod interface;
pub mod queue;
pub mod registry;
pub mod runtime;
pub mod snapshot;

pub use interface::{
    CycleContext, MAX_NODE_SCORE, MIN_NODE_SCORE, NodeScore, NodeScoreList, Plugin, PodInfo,
    QueueSortPlugin, ScoreExtensions, ScorePlugin,
};
pub use queue::SchedulingQueue;
pub use registry::{Handle, PluginFactory, Registry};
pub use runtime::{Framework, PluginConfig, Profile, ScheduleResult};
pub use snapshot::{ClusterState, NodeInfo, Snapshot, SnapshotLister};
