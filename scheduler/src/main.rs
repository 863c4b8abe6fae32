use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use scheduler::config::Config;
use scheduler::error::Error;
use scheduler::framework::{ClusterState, CycleContext, Framework, ScheduleResult, Snapshot};
use scheduler::plugins::new_in_tree_registry;
use serde::Deserialize;
use shared::models::{Node, Pod};
use tabled::{Table, Tabled, settings::Style};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Place the pending pods of a cluster manifest with the bin-packing policy.
#[derive(Parser, Debug)]
#[command(name = "binpack-sched", version, about, long_about = None)]
struct Args {
    /// Path to the YAML file with `nodes` and `pods`
    #[clap(short = 'f', long = "file")]
    file: String,

    /// Seed for tie-breaks, overrides BINPACK_SEED
    #[clap(long)]
    seed: Option<u64>,
}

/// Cluster manifest. Pods with an empty `node_name` are pending.
#[derive(Debug, Deserialize)]
struct ClusterManifest {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    pods: Vec<Pod>,
}

#[derive(Tabled)]
struct PlacementRow {
    #[tabled(rename = "POD")]
    pod: String,
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "SCORE")]
    score: String,
}

impl From<ScheduleResult> for PlacementRow {
    fn from(result: ScheduleResult) -> Self {
        PlacementRow {
            pod: result.pod,
            node: result.node.unwrap_or_else(|| "<none>".to_string()),
            score: result.score.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(results) => {
            let rows: Vec<PlacementRow> = results.into_iter().map(PlacementRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::blank());
            println!("{}", table);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("binpack-sched: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<Vec<ScheduleResult>, Error> {
    let mut config = Config::from_env()?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let content = fs::read_to_string(&args.file)
        .await
        .map_err(|source| Error::Io {
            path: args.file.clone(),
            source,
        })?;
    let manifest: ClusterManifest = serde_yaml::from_str(&content)?;
    tracing::debug!(
        nodes = manifest.nodes.len(),
        pods = manifest.pods.len(),
        "Loaded cluster manifest"
    );

    let registry = new_in_tree_registry()?;
    let state = Arc::new(ClusterState::new(Snapshot::default()));
    let mut framework = Framework::new(&registry, &config.profile, state, config.seed)?;

    // Ctrl-C cancels the run between (or inside) scoring calls
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling scheduling run");
                cancel.cancel();
            }
        });
    }

    let ctx = CycleContext::with_cancellation(cancel);
    let results = tokio::task::spawn_blocking(move || {
        framework.run(&ctx, &manifest.nodes, manifest.pods)
    })
    .await??;

    Ok(results)
}
