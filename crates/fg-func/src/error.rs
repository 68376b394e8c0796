//! Error types for function graphs.

use fg_core::NodeId;
use fg_graph::GraphError;
use thiserror::Error;

/// Result type for function graph operations.
pub type FuncResult<T> = Result<T, FuncError>;

/// Structural errors returned to the caller of a function graph operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FuncError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Node '{0}' has no function attached")]
    NoFunction(NodeId),

    #[error("Attribute '_fn' of node '{0}' does not hold a function")]
    NotCallable(NodeId),

    /// Parameter accessors refuse names the evaluator owns.
    #[error("'{0}' is a reserved attribute name")]
    ReservedAttribute(String),

    #[error("Attribute '{name}' of node '{node}' is not a plain value")]
    NotAValue { node: NodeId, name: String },

    /// `cache` or `error` read before any evaluation, or after invalidation.
    #[error("Node '{node}' has no '{what}' recorded")]
    NotEvaluated { node: NodeId, what: &'static str },

    #[error("Graph has no input named '{0}'")]
    UnknownInput(String),

    /// The nested graph bound to a node is already borrowed.
    #[error("Sub-graph bound to node '{0}' is in use")]
    SubgraphBusy(NodeId),
}

/// Failure of a single node invocation.
///
/// Execution errors are recorded in the failing node's `error` attribute and
/// never returned from `evaluate`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    /// Raised by the callable itself.
    #[error("{0}")]
    Raised(String),

    #[error("Upstream node '{node}' has no cached result for inlet '{inlet}'")]
    MissingUpstream { node: NodeId, inlet: String },

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("Argument '{name}' expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Sub-graph '{graph}' failed: {reason}")]
    Subgraph { graph: String, reason: String },
}

impl ExecError {
    /// Build a [`ExecError::Raised`] from any displayable error.
    pub fn raised(err: impl std::fmt::Display) -> Self {
        Self::Raised(err.to_string())
    }
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        Self::raised(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_errors_convert_transparently() {
        let err: FuncError = GraphError::NodeNotFound("x".into()).into();
        assert_eq!(err.to_string(), "Node 'x' not found");
    }

    #[test]
    fn io_errors_become_raised() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert_eq!(ExecError::from(io), ExecError::Raised("no such file".into()));
    }
}
