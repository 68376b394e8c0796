//! fg-graph: attributed multigraph store for flowgraph.
//!
//! Provides:
//! - `AttributedMultigraph`: directed multigraph with attribute maps on nodes and edges
//! - `PortedGraph`: policy layer whose edges connect a named outlet to a named inlet
//! - A per-graph change notification channel (`GraphEvent`, `subscribe`)
//! - Reachability (`ancestors`, `descendants`) and topological ordering
//!
//! # Example
//!
//! ```
//! use fg_core::{EdgeKey, Value};
//! use fg_graph::PortedGraph;
//!
//! let mut graph: PortedGraph<Value> = PortedGraph::new();
//! graph.add_node("source").unwrap();
//! graph.add_node("sink").unwrap();
//! graph.add_edge("source", "sink", EdgeKey::ports("out", "x")).unwrap();
//!
//! assert!(graph.add_edge("source", "sink", EdgeKey::Name("bare".into())).is_err());
//! assert_eq!(graph.in_edges("sink", Some("x")).count(), 1);
//! ```

pub mod attributes;
pub mod error;
pub mod events;
pub mod multigraph;
pub mod ported;
mod traverse;

// Re-exports for ergonomics
pub use attributes::{AttributeValue, Attributes};
pub use error::{GraphError, GraphResult};
pub use events::{Callback, EventKind, GraphEvent, SubscriptionId};
pub use multigraph::AttributedMultigraph;
pub use ported::{INLETS, OUTLETS, PortKind, PortMismatch, PortedGraph};
