//! Scheduler error types.

use thiserror::Error;

/// Failures while reading a node out of the cluster snapshot.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("node {0:?} not found")]
    NotFound(String),

    #[error("scheduling cycle cancelled")]
    Cancelled,
}

/// Failures produced while scoring one pod.
///
/// `NodeNotFound` only makes that node ineligible for the pod; the
/// other variants abort the attempt.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("getting node {node:?} from snapshot: {source}")]
    NodeNotFound {
        node: String,
        #[source]
        source: LookupError,
    },

    #[error("scheduling cycle cancelled")]
    Cancelled,

    #[error("plugin {plugin} scored node {node:?} with {score}, outside [{min}, {max}]")]
    OutOfRange {
        plugin: String,
        node: String,
        score: i64,
        min: i64,
        max: i64,
    },
}

/// Errors raised while registering or instantiating plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {0} is not registered")]
    NotRegistered(String),

    #[error("plugin {0} is already registered")]
    AlreadyRegistered(String),

    #[error("plugin {0} is enabled more than once")]
    Duplicate(String),

    #[error("failed to instantiate plugin {plugin}: {reason}")]
    Instantiation { plugin: String, reason: String },

    #[error("plugin {plugin} has invalid score weight {weight}, must be at least 1")]
    InvalidWeight { plugin: String, weight: i64 },

    #[error("no queue sort plugin enabled")]
    MissingQueueSort,

    #[error("only one queue sort plugin can be enabled, got {0:?}")]
    MultipleQueueSort(Vec<String>),
}

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} is not valid JSON: {source}")]
    InvalidJson {
        var: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Top level error for the `binpack-sched` binary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("scheduling error: {0}")]
    Score(#[from] ScoreError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cluster manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("scheduling task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
