//! Attribute values stored on function graph nodes.

use fg_core::Value;
use fg_graph::AttributeValue;

pub use fg_graph::{INLETS, OUTLETS};

use crate::error::ExecError;
use crate::function::{Function, NodeFunction};

/// The bound callable or nested graph.
pub const FN: &str = "_fn";
/// Result of the last successful invocation.
pub const CACHE: &str = "cache";
/// Failure of the last invocation.
pub const ERROR: &str = "error";
/// Position of the node in the most recent evaluation pass.
pub const EVALUATION_ORDER: &str = "evaluation_order";

/// Attribute names owned by the graph and the evaluator.
pub const RESERVED: [&str; 6] = [FN, CACHE, ERROR, INLETS, OUTLETS, EVALUATION_ORDER];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Node attribute value.
///
/// Functions compare by identity, so rebinding the same function is a no-op
/// for change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Value(Value),
    Function(NodeFunction),
    Error(ExecError),
}

impl Attr {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attr::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NodeFunction> {
        match self {
            Attr::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ExecError> {
        match self {
            Attr::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl AttributeValue for Attr {
    fn as_port_names(&self) -> Option<Vec<String>> {
        self.as_value()?.as_string_list()
    }
}

impl From<Value> for Attr {
    fn from(v: Value) -> Self {
        Attr::Value(v)
    }
}

impl From<Function> for Attr {
    fn from(f: Function) -> Self {
        Attr::Function(NodeFunction::Plain(f))
    }
}

impl From<NodeFunction> for Attr {
    fn from(f: NodeFunction) -> Self {
        Attr::Function(f)
    }
}

impl From<ExecError> for Attr {
    fn from(e: ExecError) -> Self {
        Attr::Error(e)
    }
}
