use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node in a flow graph.
///
/// Ids are caller-chosen or generated from a base name (`read` → `read1`) and
/// stay stable for the lifetime of the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::ops::Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl core::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

/// Key distinguishing parallel edges between the same ordered node pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKey {
    /// Synthesized key, unique per graph.
    Auto(u64),
    /// Caller-chosen bare key.
    Name(String),
    /// Port-addressed key: source outlet feeding target inlet.
    Ports { outlet: String, inlet: String },
}

impl EdgeKey {
    /// Build a port-addressed key.
    pub fn ports(outlet: impl Into<String>, inlet: impl Into<String>) -> Self {
        Self::Ports {
            outlet: outlet.into(),
            inlet: inlet.into(),
        }
    }

    /// Outlet name, if this is a port key.
    pub fn outlet(&self) -> Option<&str> {
        match self {
            Self::Ports { outlet, .. } => Some(outlet),
            _ => None,
        }
    }

    /// Inlet name, if this is a port key.
    pub fn inlet(&self) -> Option<&str> {
        match self {
            Self::Ports { inlet, .. } => Some(inlet),
            _ => None,
        }
    }

    pub fn is_ports(&self) -> bool {
        matches!(self, Self::Ports { .. })
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto(n) => write!(f, "#{}", n),
            Self::Name(name) => write!(f, "{}", name),
            Self::Ports { outlet, inlet } => write!(f, "({}, {})", outlet, inlet),
        }
    }
}

impl From<(&str, &str)> for EdgeKey {
    fn from((outlet, inlet): (&str, &str)) -> Self {
        Self::ports(outlet, inlet)
    }
}

impl From<(String, String)> for EdgeKey {
    fn from((outlet, inlet): (String, String)) -> Self {
        Self::Ports { outlet, inlet }
    }
}

/// Full identity of an edge: ordered endpoints plus key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId {
    pub source: NodeId,
    pub target: NodeId,
    pub key: EdgeKey,
}

impl EdgeId {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, key: EdgeKey) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            key,
        }
    }

    /// Whether `node` is one of the endpoints.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {}", self.source, self.target, self.key)
    }
}
