//! Port-addressed graph layer.
//!
//! A `PortedGraph` only accepts edges keyed by `(outlet, inlet)` and exposes
//! named-port views of a node's connections. Port names on edges are not
//! required to match the endpoints' declared ports; `validate_ports` reports
//! edges that do not.

use fg_core::{EdgeId, EdgeKey, GraphOptions, NodeId};

use crate::attributes::{AttributeValue, Attributes};
use crate::error::{GraphError, GraphResult};
use crate::events::{EventKind, GraphEvent, SubscriptionId};
use crate::multigraph::AttributedMultigraph;

/// Attribute holding an explicit list of inlet names.
pub const INLETS: &str = "inlets";
/// Attribute holding an explicit list of outlet names.
pub const OUTLETS: &str = "outlets";

/// Which end of an edge a port name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Inlet,
    Outlet,
}

/// An edge naming a port its endpoint does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMismatch {
    pub edge: EdgeId,
    pub node: NodeId,
    pub kind: PortKind,
    pub port: String,
}

/// Multigraph whose edge keys are `(outlet, inlet)` pairs.
#[derive(Debug)]
pub struct PortedGraph<A> {
    graph: AttributedMultigraph<A>,
}

impl<A: AttributeValue> Default for PortedGraph<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AttributeValue> PortedGraph<A> {
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            graph: AttributedMultigraph::with_options(options),
        }
    }

    /// The underlying multigraph (read-only).
    pub fn base(&self) -> &AttributedMultigraph<A> {
        &self.graph
    }

    /// The underlying multigraph.
    ///
    /// Edges added through this handle bypass the port-key check.
    pub fn base_mut(&mut self) -> &mut AttributedMultigraph<A> {
        &mut self.graph
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Add an edge keyed by `(outlet, inlet)`.
    ///
    /// Any other key is rejected with [`GraphError::MalformedEdgeKey`] before
    /// the graph is touched.
    pub fn add_edge(&mut self, source: &str, target: &str, key: EdgeKey) -> GraphResult<EdgeId> {
        Self::check_key(&key)?;
        self.graph.add_edge(source, target, Some(key))
    }

    /// Add a port-keyed edge with initial attributes.
    pub fn add_edge_with<I, K>(
        &mut self,
        source: &str,
        target: &str,
        key: EdgeKey,
        attrs: I,
    ) -> GraphResult<EdgeId>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        Self::check_key(&key)?;
        self.graph.add_edge_with(source, target, Some(key), attrs)
    }

    /// Connect `source.outlet` to `target.inlet`.
    pub fn connect(&mut self, source: &str, outlet: &str, target: &str, inlet: &str) -> GraphResult<EdgeId> {
        self.add_edge(source, target, EdgeKey::ports(outlet, inlet))
    }

    fn check_key(key: &EdgeKey) -> GraphResult<()> {
        if key.is_ports() {
            Ok(())
        } else {
            Err(GraphError::MalformedEdgeKey(key.clone()))
        }
    }

    pub fn remove_edge(&mut self, edge: &EdgeId) -> GraphResult<Attributes<A>> {
        self.graph.remove_edge(edge)
    }

    /// Incoming edges, optionally restricted to one inlet.
    pub fn in_edges<'a>(
        &'a self,
        id: &str,
        inlet: Option<&'a str>,
    ) -> impl Iterator<Item = &'a EdgeId> + use<'a, A> {
        self.graph
            .in_edges(id)
            .filter(move |e| inlet.is_none_or(|name| e.key.inlet() == Some(name)))
    }

    /// Outgoing edges, optionally restricted to one outlet.
    pub fn out_edges<'a>(
        &'a self,
        id: &str,
        outlet: Option<&'a str>,
    ) -> impl Iterator<Item = &'a EdgeId> + use<'a, A> {
        self.graph
            .out_edges(id)
            .filter(move |e| outlet.is_none_or(|name| e.key.outlet() == Some(name)))
    }

    // ------------------------------------------------------------------
    // Ports
    // ------------------------------------------------------------------

    /// Declared inlet names (`inlets` attribute), empty if unset.
    pub fn inlets(&self, id: &str) -> GraphResult<Vec<String>> {
        self.declared_ports(id, INLETS)
    }

    /// Declared outlet names (`outlets` attribute), empty if unset.
    pub fn outlets(&self, id: &str) -> GraphResult<Vec<String>> {
        self.declared_ports(id, OUTLETS)
    }

    fn declared_ports(&self, id: &str, attribute: &str) -> GraphResult<Vec<String>> {
        let attrs = self.graph.attributes(id)?;
        Ok(attrs
            .get(attribute)
            .and_then(AttributeValue::as_port_names)
            .unwrap_or_default())
    }

    /// Edges whose outlet or inlet is not among its endpoint's declared ports.
    ///
    /// `ports_of` supplies the declared ports; layers that derive ports from
    /// something other than attributes pass their own lookup.
    pub fn port_mismatches<F>(&self, mut ports_of: F) -> Vec<PortMismatch>
    where
        F: FnMut(&NodeId, PortKind) -> Vec<String>,
    {
        let mut mismatches = Vec::new();
        for edge in self.graph.edges() {
            let (Some(outlet), Some(inlet)) = (edge.key.outlet(), edge.key.inlet()) else {
                continue;
            };
            for (node, kind, port) in [
                (&edge.source, PortKind::Outlet, outlet),
                (&edge.target, PortKind::Inlet, inlet),
            ] {
                if !ports_of(node, kind).iter().any(|p| p == port) {
                    mismatches.push(PortMismatch {
                        edge: edge.clone(),
                        node: node.clone(),
                        kind,
                        port: port.to_string(),
                    });
                }
            }
        }
        mismatches
    }

    /// [`Self::port_mismatches`] against the `inlets`/`outlets` attributes.
    pub fn validate_ports(&self) -> Vec<PortMismatch> {
        self.port_mismatches(|node, kind| {
            let ports = match kind {
                PortKind::Inlet => self.inlets(node),
                PortKind::Outlet => self.outlets(node),
            };
            ports.unwrap_or_default()
        })
    }

    // ------------------------------------------------------------------
    // Delegation to the multigraph
    // ------------------------------------------------------------------

    pub fn add_node(&mut self, id: impl Into<NodeId>) -> GraphResult<()> {
        self.graph.add_node(id)
    }

    pub fn add_node_with<I, K>(&mut self, id: impl Into<NodeId>, attrs: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        self.graph.add_node_with(id, attrs)
    }

    pub fn remove_node(&mut self, id: &str) -> GraphResult<Attributes<A>> {
        self.graph.remove_node(id)
    }

    pub fn update_attributes<I, K>(&mut self, id: &str, attrs: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        self.graph.update_attributes(id, attrs)
    }

    pub fn delete_attribute(&mut self, id: &str, name: &str) -> GraphResult<A> {
        self.graph.delete_attribute(id, name)
    }

    pub fn attribute(&self, id: &str, name: &str) -> GraphResult<&A> {
        self.graph.attribute(id, name)
    }

    pub fn has_attribute(&self, id: &str, name: &str) -> bool {
        self.graph.has_attribute(id, name)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.graph.contains_node(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.graph.edges()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<A>) + 'static,
    {
        self.graph.subscribe(kind, callback)
    }

    pub fn subscribe_all<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<A>) + 'static,
    {
        self.graph.subscribe_all(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.graph.unsubscribe(id)
    }
}
