use shared::models::Pod;

use super::BinPacking;
use crate::error::ScoreError;
use crate::framework::{CycleContext, MAX_NODE_SCORE, NodeScore, ScoreExtensions};

/// Rescale one pod's raw scores into `[0, MAX_NODE_SCORE]`:
/// `(raw - min) * MAX_NODE_SCORE / (max - min)`, truncating.
///
/// When every node scored the same, `min` is lowered by one, which
/// places every node at exactly `MAX_NODE_SCORE`.
pub fn normalize(scores: &mut [NodeScore]) {
    let Some(highest) = scores.iter().map(|s| i128::from(s.score)).max() else {
        return;
    };
    let mut lowest = scores
        .iter()
        .map(|s| i128::from(s.score))
        .min()
        .unwrap_or(highest);
    if highest == lowest {
        lowest -= 1;
    }

    let range = highest - lowest;
    for node_score in scores.iter_mut() {
        let scaled = (i128::from(node_score.score) - lowest) * i128::from(MAX_NODE_SCORE) / range;
        node_score.score = scaled as i64;
        tracing::debug!("host: {}, final score: {}", node_score.name, node_score.score);
    }
}

impl ScoreExtensions for BinPacking {
    fn normalize_score(
        &self,
        _ctx: &CycleContext,
        pod: &Pod,
        scores: &mut [NodeScore],
    ) -> Result<(), ScoreError> {
        tracing::trace!(pod=%pod.metadata.name, nodes = scores.len(), "Normalizing scores");
        normalize(scores);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use crate::framework::{Handle, Snapshot};

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn batch(raw: &[i64]) -> Vec<NodeScore> {
        raw.iter()
            .enumerate()
            .map(|(i, score)| NodeScore::new(&format!("node-{i}"), *score))
            .collect()
    }

    fn normalized(raw: &[i64]) -> Vec<i64> {
        let mut scores = batch(raw);
        normalize(&mut scores);
        scores.into_iter().map(|s| s.score).collect()
    }

    #[test]
    fn test_all_equal_scores_become_max() {
        assert_eq!(normalized(&[5, 5, 5]), vec![100, 100, 100]);
        assert_eq!(normalized(&[0, 0]), vec![100, 100]);
        assert_eq!(normalized(&[40]), vec![100]);
    }

    #[test]
    fn test_scores_span_full_range() {
        assert_eq!(normalized(&[0, 10, 5]), vec![0, 100, 50]);
        assert_eq!(normalized(&[10, 40, 20]), vec![0, 100, 33]);
    }

    #[test]
    fn test_normalized_scores_are_bounded() {
        for score in normalized(&[0, 7, 13, 70, 130, 1_000_000]) {
            assert!((0..=MAX_NODE_SCORE).contains(&score));
        }
    }

    #[test]
    fn test_normalization_is_idempotent_on_bounded_batch() {
        let once = normalized(&[0, 25, 50, 100]);
        assert_eq!(once, vec![0, 25, 50, 100]);
        assert_eq!(normalized(&once), once);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        assert!(normalized(&[]).is_empty());
    }

    #[test]
    fn test_names_and_order_preserved() {
        let mut scores = batch(&[30, 10, 20]);
        normalize(&mut scores);
        let names: Vec<_> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["node-0", "node-1", "node-2"]);
    }

    #[test]
    fn test_final_scores_are_logged_per_host() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();

        let scores = tracing::subscriber::with_default(subscriber, || normalized(&[0, 10, 5]));
        assert_eq!(scores, vec![0, 100, 50]);

        let output = logs.contents();
        assert!(output.contains("host: node-0, final score: 0"), "{output}");
        assert!(output.contains("host: node-1, final score: 100"), "{output}");
        assert!(output.contains("host: node-2, final score: 50"), "{output}");
    }

    #[test]
    fn test_extension_always_succeeds() {
        let plugin = BinPacking::with_handle(Handle::new(Arc::new(Snapshot::default())));
        let mut scores = batch(&[20, 20]);

        plugin
            .normalize_score(&CycleContext::new(), &Pod::default(), &mut scores)
            .unwrap();
        assert!(scores.iter().all(|s| s.score == MAX_NODE_SCORE));
    }
}
