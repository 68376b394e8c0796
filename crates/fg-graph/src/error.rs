//! Graph-specific error types.

use fg_core::{EdgeId, EdgeKey, NodeId};
use thiserror::Error;

/// Result type for graph store operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Structural errors raised by the graph store.
///
/// Every operation validates before mutating, so a returned error means the
/// graph is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' already exists")]
    DuplicateNode(NodeId),

    #[error("Node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} already exists")]
    DuplicateEdge(EdgeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Self-loop on node '{0}' is not allowed")]
    SelfLoop(NodeId),

    /// A ported graph only accepts `(outlet, inlet)` keys.
    #[error("Edge key {0} is not an (outlet, inlet) pair")]
    MalformedEdgeKey(EdgeKey),

    #[error("Node '{node}' has no attribute '{name}'")]
    AttributeNotFound { node: NodeId, name: String },

    #[error("Edge {edge} has no attribute '{name}'")]
    EdgeAttributeNotFound { edge: EdgeId, name: String },

    #[error("Graph contains a cycle through {}", format_nodes(.nodes))]
    Cycle { nodes: Vec<NodeId> },
}

fn format_nodes(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
