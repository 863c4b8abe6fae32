use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::models::Pod;
use tokio_util::sync::CancellationToken;

use crate::error::ScoreError;

/// Upper bound of a normalized node score.
pub const MAX_NODE_SCORE: i64 = 100;
/// Lower bound of a normalized node score.
pub const MIN_NODE_SCORE: i64 = 0;

/// A pending pod together with the time it entered the queue.
#[derive(Debug, Clone)]
pub struct PodInfo {
    pub pod: Pod,
    pub timestamp: DateTime<Utc>,
}

impl PodInfo {
    /// Queue a pod, using its creation time as arrival time.
    pub fn new(pod: Pod) -> Self {
        let timestamp = pod.metadata.created_at;
        Self { pod, timestamp }
    }

    pub fn with_timestamp(pod: Pod, timestamp: DateTime<Utc>) -> Self {
        Self { pod, timestamp }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScore {
    pub name: String,
    pub score: i64,
}

impl NodeScore {
    pub fn new(name: &str, score: i64) -> Self {
        Self {
            name: name.to_string(),
            score,
        }
    }
}

/// Scores of every candidate node for a single pod.
pub type NodeScoreList = Vec<NodeScore>;

/// State carried through one scheduling attempt.
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    cancel: CancellationToken,
}

impl CycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// A unit registered with the framework. Capabilities are exposed through
/// the `as_*` accessors so one type can take part in several extension
/// points.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn as_queue_sort(self: Arc<Self>) -> Option<Arc<dyn QueueSortPlugin>> {
        None
    }

    fn as_score_plugin(self: Arc<Self>) -> Option<Arc<dyn ScorePlugin>> {
        None
    }
}

/// Orders the pending queue.
pub trait QueueSortPlugin: Send + Sync {
    /// True iff `a` must be dequeued before `b`.
    fn less(&self, a: &PodInfo, b: &PodInfo) -> bool;
}

/// Ranks nodes that passed filtering.
pub trait ScorePlugin: Send + Sync {
    /// Raw score of `node_name` for `pod`.
    fn score(&self, ctx: &CycleContext, pod: &Pod, node_name: &str) -> Result<i64, ScoreError>;

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        None
    }
}

/// Post-processing of a plugin's complete score batch for one pod.
pub trait ScoreExtensions: Send + Sync {
    /// Rewrite `scores` in place into `[MIN_NODE_SCORE, MAX_NODE_SCORE]`.
    fn normalize_score(
        &self,
        ctx: &CycleContext,
        pod: &Pod,
        scores: &mut [NodeScore],
    ) -> Result<(), ScoreError>;
}
