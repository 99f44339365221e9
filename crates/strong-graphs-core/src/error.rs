use thiserror::Error;

use crate::network::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("node {0} already present")]
    DuplicateNode(NodeId),
    #[error("node {0} not present")]
    MissingNode(NodeId),
    #[error("self loop on node {0}")]
    SelfLoop(NodeId),
    #[error("arc ({0}, {1}) already present")]
    DuplicateArc(NodeId, NodeId),
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("infeasible budget: {0}")]
    InfeasibleBudget(String),
    #[error("could not sample {requested} predecessors of node {node} within {rounds} rounds")]
    SamplingExhausted {
        node: NodeId,
        requested: usize,
        rounds: usize,
    },
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl GeneratorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub(crate) fn infeasible(msg: impl Into<String>) -> Self {
        Self::InfeasibleBudget(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}
