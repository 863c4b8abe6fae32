use shared::models::Pod;

use super::{BinPacking, OCCUPANCY_WEIGHT};
use crate::error::{LookupError, ScoreError};
use crate::framework::{CycleContext, ScoreExtensions, ScorePlugin};

impl ScorePlugin for BinPacking {
    /// `occupancy * OCCUPANCY_WEIGHT`: busier nodes score higher.
    fn score(&self, ctx: &CycleContext, pod: &Pod, node_name: &str) -> Result<i64, ScoreError> {
        let node_info = self
            .handle
            .snapshot_lister()
            .node_info(ctx, node_name)
            .map_err(|err| match err {
                LookupError::Cancelled => ScoreError::Cancelled,
                err => ScoreError::NodeNotFound {
                    node: node_name.to_string(),
                    source: err,
                },
            })?;

        let occupancy = i64::try_from(node_info.occupancy()).unwrap_or(i64::MAX);
        let score = occupancy.saturating_mul(OCCUPANCY_WEIGHT);
        tracing::trace!(pod=%pod.metadata.name, node=%node_name, occupancy, score, "Raw score");
        Ok(score)
    }

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use shared::models::Node;
    use tokio_util::sync::CancellationToken;

    use crate::framework::{Handle, Snapshot};

    fn plugin_with(occupancy: &[(&str, usize)]) -> BinPacking {
        let nodes: Vec<Node> = occupancy.iter().map(|(name, _)| Node::named(name)).collect();
        let pods: Vec<Pod> = occupancy
            .iter()
            .flat_map(|(name, count)| {
                (0..*count).map(move |_| {
                    let mut pod = Pod::default();
                    pod.spec.node_name = name.to_string();
                    pod
                })
            })
            .collect();
        BinPacking::with_handle(Handle::new(Arc::new(Snapshot::new(&nodes, &pods))))
    }

    #[test]
    fn test_score_is_occupancy_times_weight() {
        let plugin = plugin_with(&[("empty", 0), ("busy", 3), ("full", 12)]);
        let ctx = CycleContext::new();
        let pod = Pod::default();

        assert_eq!(plugin.score(&ctx, &pod, "empty").unwrap(), 0);
        assert_eq!(plugin.score(&ctx, &pod, "busy").unwrap(), 3 * OCCUPANCY_WEIGHT);
        assert_eq!(plugin.score(&ctx, &pod, "full").unwrap(), 120);
    }

    #[test]
    fn test_unknown_node_is_node_not_found() {
        let plugin = plugin_with(&[("a", 1)]);
        let err = plugin
            .score(&CycleContext::new(), &Pod::default(), "missing")
            .expect_err("node is not in the snapshot");

        match err {
            ScoreError::NodeNotFound { node, source } => {
                assert_eq!(node, "missing");
                assert!(matches!(source, LookupError::NotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_not_found_message_names_the_node() {
        let plugin = plugin_with(&[]);
        let err = plugin
            .score(&CycleContext::new(), &Pod::default(), "n1")
            .unwrap_err();
        assert!(err.to_string().contains("\"n1\""));
    }

    #[test]
    fn test_cancelled_score_returns_promptly() {
        let plugin = plugin_with(&[("a", 1)]);
        let token = CancellationToken::new();
        token.cancel();

        let err = plugin
            .score(&CycleContext::with_cancellation(token), &Pod::default(), "a")
            .unwrap_err();
        assert!(matches!(err, ScoreError::Cancelled));
    }

    #[test]
    fn test_score_plugin_has_normalization() {
        let plugin = plugin_with(&[]);
        assert!(plugin.score_extensions().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scoring_against_one_snapshot() {
        let plugin = Arc::new(plugin_with(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]));

        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|node| {
                let plugin = plugin.clone();
                tokio::spawn(async move {
                    plugin
                        .score(&CycleContext::new(), &Pod::default(), node)
                        .unwrap()
                })
            })
            .collect();

        let mut scores = Vec::new();
        for handle in handles {
            scores.push(handle.await.unwrap());
        }
        assert_eq!(scores, vec![10, 20, 30, 40]);
    }
}
