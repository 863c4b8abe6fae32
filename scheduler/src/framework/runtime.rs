//! Scheduling cycle for a single pod: filter candidate nodes, score them
//! with every score plugin, normalize each plugin's batch and pick the
//! node with the highest weighted total.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::Value;
use shared::models::{Node, Pod};

use super::interface::{
    CycleContext, MAX_NODE_SCORE, MIN_NODE_SCORE, NodeScore, NodeScoreList, PodInfo,
    QueueSortPlugin, ScorePlugin,
};
use super::queue::SchedulingQueue;
use super::registry::{Handle, Registry};
use super::snapshot::{ClusterState, Snapshot, SnapshotLister};
use crate::error::{PluginError, ScoreError};

/// One enabled plugin. `weight` scales the plugin's normalized scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default)]
    pub args: Option<Value>,
}

fn default_weight() -> i64 {
    1
}

impl PluginConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: default_weight(),
            args: None,
        }
    }
}

/// Ordered list of enabled plugins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Profile {
    pub plugins: Vec<PluginConfig>,
}

/// Outcome of scheduling one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleResult {
    pub pod: String,
    /// `None` when no node was feasible
    pub node: Option<String>,
    pub score: Option<i64>,
}

struct WeightedScorePlugin {
    name: String,
    weight: i64,
    plugin: Arc<dyn ScorePlugin>,
}

pub struct Framework {
    queue_sort: Arc<dyn QueueSortPlugin>,
    score_plugins: Vec<WeightedScorePlugin>,
    state: Arc<ClusterState>,
    rng: StdRng,
}

impl Framework {
    /// Instantiate the profile's plugins in order. `seed` fixes the
    /// tie-break between equally scored nodes.
    pub fn new(
        registry: &Registry,
        profile: &Profile,
        state: Arc<ClusterState>,
        seed: Option<u64>,
    ) -> Result<Self, PluginError> {
        let handle = Handle::new(state.clone());
        let mut enabled = HashSet::new();
        let mut queue_sorts = Vec::new();
        let mut score_plugins = Vec::new();

        for config in &profile.plugins {
            if !enabled.insert(config.name.as_str()) {
                return Err(PluginError::Duplicate(config.name.clone()));
            }
            let plugin = registry.build(&config.name, config.args.as_ref(), handle.clone())?;

            if let Some(sorter) = plugin.clone().as_queue_sort() {
                queue_sorts.push((config.name.clone(), sorter));
            }
            if let Some(scorer) = plugin.as_score_plugin() {
                if config.weight < 1 {
                    return Err(PluginError::InvalidWeight {
                        plugin: config.name.clone(),
                        weight: config.weight,
                    });
                }
                score_plugins.push(WeightedScorePlugin {
                    name: config.name.clone(),
                    weight: config.weight,
                    plugin: scorer,
                });
            }
            tracing::debug!(plugin=%config.name, "Enabled plugin");
        }

        let queue_sort = match queue_sorts.len() {
            0 => return Err(PluginError::MissingQueueSort),
            1 => queue_sorts.remove(0).1,
            _ => {
                return Err(PluginError::MultipleQueueSort(
                    queue_sorts.into_iter().map(|(name, _)| name).collect(),
                ));
            }
        };

        Ok(Self {
            queue_sort,
            score_plugins,
            state,
            rng: StdRng::seed_from_u64(seed.unwrap_or_else(rand::random)),
        })
    }

    /// Empty queue ordered by the enabled queue sort plugin.
    pub fn new_queue(&self) -> SchedulingQueue {
        SchedulingQueue::new(self.queue_sort.clone())
    }

    /// Drain all unbound pods, placing them one at a time. The snapshot is
    /// rebuilt before each pod so earlier placements count toward occupancy.
    pub fn run(
        &mut self,
        ctx: &CycleContext,
        nodes: &[Node],
        pods: Vec<Pod>,
    ) -> Result<Vec<ScheduleResult>, ScoreError> {
        let (mut bound, pending): (Vec<Pod>, Vec<Pod>) =
            pods.into_iter().partition(|pod| pod.is_bound());

        let mut queue = self.new_queue();
        queue.extend(pending.into_iter().map(PodInfo::new));
        tracing::info!(pending = queue.len(), nodes = nodes.len(), "Starting scheduling run");

        let mut results = Vec::with_capacity(queue.len());
        while let Some(mut info) = queue.pop() {
            self.state.update(Snapshot::new(nodes, &bound));
            let result = self.schedule_one(ctx, &info)?;

            match &result.node {
                Some(node) => {
                    tracing::info!(pod=%result.pod, %node, score=?result.score, "Scheduled");
                    info.pod.spec.node_name = node.clone();
                    bound.push(info.pod);
                }
                None => tracing::warn!(pod=%result.pod, "Could not schedule pod"),
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Pick a node for one pod against the current snapshot.
    pub fn schedule_one(
        &mut self,
        ctx: &CycleContext,
        info: &PodInfo,
    ) -> Result<ScheduleResult, ScoreError> {
        if ctx.is_cancelled() {
            return Err(ScoreError::Cancelled);
        }
        let pod = &info.pod;

        let candidates = self.filter(pod);
        if candidates.is_empty() {
            tracing::warn!(pod=%pod.metadata.name, "No schedulable nodes");
            return Ok(ScheduleResult {
                pod: pod.metadata.name.clone(),
                node: None,
                score: None,
            });
        }

        let totals = self.score(ctx, pod, &candidates)?;
        let chosen = self.select(&totals);

        Ok(ScheduleResult {
            pod: pod.metadata.name.clone(),
            node: chosen.as_ref().map(|s| s.name.clone()),
            score: chosen.map(|s| s.score),
        })
    }

    /// Nodes that may receive new pods.
    fn filter(&self, pod: &Pod) -> Vec<String> {
        self.state
            .list()
            .into_iter()
            .filter(|info| {
                let ok = info.node.status.is_schedulable();
                if !ok {
                    tracing::debug!(
                        pod=%pod.metadata.name,
                        node=%info.node.name,
                        status=%info.node.status,
                        "Filtered out node"
                    );
                }
                ok
            })
            .map(|info| info.node.name.clone())
            .collect()
    }

    /// Weighted totals per node. A node a plugin cannot find is dropped from
    /// every plugin's batch before normalization, so each batch covers
    /// exactly the same nodes.
    fn score(
        &self,
        ctx: &CycleContext,
        pod: &Pod,
        candidates: &[String],
    ) -> Result<NodeScoreList, ScoreError> {
        let mut ineligible: HashSet<String> = HashSet::new();
        let mut batches: Vec<NodeScoreList> = Vec::with_capacity(self.score_plugins.len());

        for weighted in &self.score_plugins {
            let mut batch = NodeScoreList::with_capacity(candidates.len());
            for node in candidates {
                match weighted.plugin.score(ctx, pod, node) {
                    Ok(score) => batch.push(NodeScore::new(node, score)),
                    Err(err @ ScoreError::NodeNotFound { .. }) => {
                        tracing::warn!(
                            plugin=%weighted.name,
                            pod=%pod.metadata.name,
                            error=%err,
                            "Node ineligible"
                        );
                        ineligible.insert(node.clone());
                    }
                    Err(err) => return Err(err),
                }
            }
            batches.push(batch);
        }

        let mut totals: NodeScoreList = candidates
            .iter()
            .filter(|node| !ineligible.contains(*node))
            .map(|node| NodeScore::new(node, 0))
            .collect();

        for (weighted, mut batch) in self.score_plugins.iter().zip(batches) {
            batch.retain(|s| !ineligible.contains(&s.name));
            if let Some(extensions) = weighted.plugin.score_extensions() {
                extensions.normalize_score(ctx, pod, &mut batch)?;
            }

            for (total, node_score) in totals.iter_mut().zip(&batch) {
                if !(MIN_NODE_SCORE..=MAX_NODE_SCORE).contains(&node_score.score) {
                    return Err(ScoreError::OutOfRange {
                        plugin: weighted.name.clone(),
                        node: node_score.name.clone(),
                        score: node_score.score,
                        min: MIN_NODE_SCORE,
                        max: MAX_NODE_SCORE,
                    });
                }
                total.score = total
                    .score
                    .saturating_add(node_score.score.saturating_mul(weighted.weight));
            }
        }

        Ok(totals)
    }

    /// Highest total wins; equal totals are resolved uniformly at random.
    fn select(&mut self, totals: &[NodeScore]) -> Option<NodeScore> {
        let mut selected: Option<&NodeScore> = None;
        let mut ties = 0u32;

        for candidate in totals {
            match selected {
                Some(best) if candidate.score < best.score => {}
                Some(best) if candidate.score == best.score => {
                    ties += 1;
                    if self.rng.random_range(0..ties) == 0 {
                        selected = Some(candidate);
                    }
                }
                _ => {
                    selected = Some(candidate);
                    ties = 1;
                }
            }
        }
        selected.cloned()
    }
}
