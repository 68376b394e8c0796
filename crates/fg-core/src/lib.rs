//! fg-core: shared foundation for flowgraph.
//!
//! Contains:
//! - ids (node ids, edge keys, edge ids)
//! - value (the dynamic value passed along edges and stored as parameters)
//! - config (graph and evaluation options, loadable from YAML)
//! - timing (opt-in wall-clock measurement of node execution)
//! - error (shared error types)

pub mod config;
pub mod error;
pub mod ids;
pub mod timing;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use config::{EvalOptions, FlowConfig, GraphOptions};
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use value::Value;
