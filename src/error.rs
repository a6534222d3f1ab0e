//! Error types for the mdpkit crate

use thiserror::Error;

/// Main error type for the mdpkit crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("discount factor {value} must lie in [0, 1]")]
    InvalidDiscount { value: f64 },

    #[error("trace decay {value} must lie in [0, 1]")]
    InvalidTraceDecay { value: f64 },

    #[error("greediness {value} must be finite and at least 1")]
    InvalidGreediness { value: f64 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("no model is set; '{operation}' requires one")]
    MissingModel { operation: String },

    #[error("agent definitions cannot change after planning has started")]
    AgentDefinitionsLocked,

    #[error(
        "value backups require a populated state space; run reachability or add states first"
    )]
    ReachabilityNotPerformed,

    #[error("policy is not defined for state {state}")]
    PolicyUndefined { state: String },

    #[error("search exhausted the open list after {expanded} expansions without reaching a goal")]
    NoPlanFound { expanded: usize },

    #[error("variable key '{key}' is not recognized by the hashing scheme")]
    InvalidStateKind { key: String },

    #[error("state is missing expected variable '{key}'")]
    MissingVariable { key: String },

    #[error("no applicable actions in state {state}")]
    NoApplicableActions { state: String },

    #[error("dataset has no samples")]
    EmptyDataset,

    #[error("feature vector has {got} entries, expected {expected}")]
    FeatureDimension { expected: usize, got: usize },

    #[error("transition probabilities for {context} sum to {total}, expected 1")]
    InvalidTransitionDistribution { context: String, total: f64 },

    #[error("node {node} is not part of the graph (size {size})")]
    UnknownNode { node: usize, size: usize },

    #[error("model failure: {message}")]
    Model { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
