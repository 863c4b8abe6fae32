//! SCHEDULING CYCLE TESTS
//!
//! - test_pending_pods_pack_onto_busiest_node
//!     queue order follows priority, footprint and arrival, and every
//!     pod lands on the node that already runs the most pods.
//! - test_empty_cluster_consolidates_onto_one_node
//!     with no occupancy the first pick is a tie, later pods follow it.
//! - test_run_stops_when_cancelled

use std::sync::Arc;

use scheduler::config::Config;
use scheduler::error::ScoreError;
use scheduler::framework::{ClusterState, CycleContext, Framework, PodInfo, Snapshot};
use scheduler::plugins::new_in_tree_registry;
use serde::Deserialize;
use shared::models::{Node, Pod};

#[derive(Deserialize)]
struct Manifest {
    nodes: Vec<Node>,
    pods: Vec<Pod>,
}

const CLUSTER: &str = r#"
nodes:
  - name: n0
    status: Stopped
  - name: n1
  - name: n2
  - name: n3
pods:
  - metadata: { name: old-0 }
    spec: { node_name: n0 }
  - metadata: { name: old-1 }
    spec: { node_name: n0 }
  - metadata: { name: old-2 }
    spec: { node_name: n0 }
  - metadata: { name: old-3 }
    spec: { node_name: n1 }
  - metadata: { name: old-4 }
    spec: { node_name: n1 }
  - metadata: { name: old-5 }
    spec: { node_name: n3 }
  - metadata: { name: batch, created_at: "2024-01-01T00:00:03Z" }
    spec:
      priority: 5
      containers:
        - name: job
          resources: { limits: { cpu: 8, memory: 16Gi } }
  - metadata: { name: big, created_at: "2024-01-01T00:00:01Z" }
    spec:
      priority: 10
      containers:
        - name: app
          resources: { limits: { cpu: "2", memory: 1Gi } }
  - metadata: { name: small, created_at: "2024-01-01T00:00:02Z" }
    spec:
      priority: 10
      containers:
        - name: app
          resources: { limits: { cpu: "1", memory: 1Gi } }
  - metadata: { name: frac, created_at: "2024-01-01T00:00:00Z" }
    spec:
      priority: 10
      containers:
        - name: app
          resources: { limits: { cpu: 500m } }
"#;

fn framework(nodes: &[Node], seed: u64) -> Framework {
    let config = Config::from_lookup(|_| None).expect("default config");
    let registry = new_in_tree_registry().expect("in-tree plugins register");
    let state = Arc::new(ClusterState::new(Snapshot::new(nodes, &[])));
    Framework::new(&registry, &config.profile, state, Some(seed)).expect("profile is valid")
}

fn pending(name: &str) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = name.to_string();
    pod
}

#[test]
fn test_pending_pods_pack_onto_busiest_node() {
    let manifest: Manifest = serde_yaml::from_str(CLUSTER).unwrap();
    let mut fw = framework(&manifest.nodes, 1);

    let results = fw
        .run(&CycleContext::new(), &manifest.nodes, manifest.pods)
        .unwrap();

    let order: Vec<_> = results.iter().map(|r| r.pod.as_str()).collect();
    assert_eq!(order, vec!["frac", "big", "small", "batch"]);

    for result in &results {
        assert_eq!(result.node.as_deref(), Some("n1"), "{} misplaced", result.pod);
        assert_eq!(result.score, Some(100));
    }
}

#[test]
fn test_empty_cluster_consolidates_onto_one_node() {
    let nodes = vec![Node::named("a"), Node::named("b"), Node::named("c")];
    let mut fw = framework(&nodes, 99);

    let pods = (0..5).map(|i| pending(&format!("pod-{i}"))).collect();
    let results = fw.run(&CycleContext::new(), &nodes, pods).unwrap();

    let first = results[0].node.clone().expect("first pod placed");
    assert!(results.iter().all(|r| r.node.as_ref() == Some(&first)));
}

#[test]
fn test_same_seed_same_placement() {
    let nodes = vec![Node::named("a"), Node::named("b"), Node::named("c")];
    let run = |seed| {
        let mut fw = framework(&nodes, seed);
        fw.run(&CycleContext::new(), &nodes, vec![pending("p")])
            .unwrap()
            .remove(0)
            .node
    };
    assert_eq!(run(5), run(5));
}

#[test]
fn test_run_stops_when_cancelled() {
    let nodes = vec![Node::named("a")];
    let mut fw = framework(&nodes, 1);
    let ctx = CycleContext::new();
    ctx.cancellation_token().cancel();

    let result = fw.run(&ctx, &nodes, vec![pending("p")]);
    assert!(matches!(result, Err(ScoreError::Cancelled)));
}

#[test]
fn test_queue_uses_bin_packing_order() {
    let manifest: Manifest = serde_yaml::from_str(CLUSTER).unwrap();
    let fw = framework(&manifest.nodes, 1);

    let mut queue = fw.new_queue();
    queue.extend(
        manifest
            .pods
            .into_iter()
            .filter(|pod| !pod.is_bound())
            .map(PodInfo::new),
    );

    let first = queue.pop().unwrap();
    assert_eq!(first.pod.metadata.name, "frac");
    assert_eq!(queue.len(), 3);
}
