//! Directed multigraph with attributed nodes and edges.

use std::collections::HashMap;

use fg_core::{EdgeId, EdgeKey, GraphOptions, NodeId};
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::attributes::{self, AttributeValue, Attributes};
use crate::error::{GraphError, GraphResult};
use crate::events::{ChangeChannel, EventKind, GraphEvent, SubscriptionId};

/// Directed multigraph where every node and edge carries an attribute map.
///
/// - Nodes and edges iterate in insertion order.
/// - Parallel edges between the same ordered pair are allowed if their keys differ.
/// - Self-loops are rejected.
/// - Every mutation is published to the graph's subscribers (see [`crate::events`]).
#[derive(Debug)]
pub struct AttributedMultigraph<A> {
    options: GraphOptions,
    nodes: IndexMap<NodeId, Attributes<A>>,
    edges: IndexMap<EdgeId, Attributes<A>>,
    /// Outgoing edges per node, in insertion order.
    out_adj: HashMap<NodeId, IndexSet<EdgeId>>,
    /// Incoming edges per node, in insertion order.
    in_adj: HashMap<NodeId, IndexSet<EdgeId>>,
    next_key: u64,
    channel: ChangeChannel<A>,
}

impl<A: AttributeValue> Default for AttributedMultigraph<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AttributeValue> AttributedMultigraph<A> {
    /// Create an empty graph with default options.
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    /// Create an empty graph with the given options.
    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            out_adj: HashMap::new(),
            in_adj: HashMap::new(),
            next_key: 0,
            channel: ChangeChannel::new(),
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to one kind of event.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<A>) + 'static,
    {
        self.channel.subscribe(Some(kind), Box::new(callback))
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<A>) + 'static,
    {
        self.channel.subscribe(None, Box::new(callback))
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.channel.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.len()
    }

    fn emit(&mut self, event: GraphEvent) {
        if self.channel.is_empty() {
            return;
        }
        trace!(?event, "graph event");
        let mut subscriptions = self.channel.take();
        for subscription in &mut subscriptions {
            subscription.deliver(&event, self);
        }
        self.channel.restore(subscriptions);
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node with no attributes.
    pub fn add_node(&mut self, id: impl Into<NodeId>) -> GraphResult<()> {
        self.insert_node(id.into(), Attributes::new())
    }

    /// Add a node with initial attributes.
    ///
    /// Emits `NodesAdded`, then `NodeAttributesAdded` naming the supplied keys.
    pub fn add_node_with<I, K>(&mut self, id: impl Into<NodeId>, attrs: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        self.insert_node(id.into(), attributes::collect(attrs))
    }

    fn insert_node(&mut self, id: NodeId, attrs: Attributes<A>) -> GraphResult<()> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let names: Vec<String> = attrs.keys().cloned().collect();
        self.nodes.insert(id.clone(), attrs);
        self.out_adj.insert(id.clone(), IndexSet::new());
        self.in_adj.insert(id.clone(), IndexSet::new());

        self.emit(GraphEvent::NodesAdded(vec![id.clone()]));
        if !names.is_empty() {
            self.emit(GraphEvent::NodeAttributesAdded { node: id, names });
        }
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Attributes<A>> {
        let id = self.node_key(id)?;
        self.emit(GraphEvent::NodesAboutToBeRemoved(vec![id.clone()]));

        let incident: Vec<EdgeId> = self.out_adj[&id]
            .iter()
            .chain(self.in_adj[&id].iter())
            .cloned()
            .collect();
        for edge in incident {
            self.detach_edge(edge);
        }

        self.out_adj.remove(&id);
        self.in_adj.remove(&id);
        let attrs = self.nodes.shift_remove(&id).unwrap_or_default();
        self.emit(GraphEvent::NodesRemoved(vec![id]));
        Ok(attrs)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.keys()
    }

    /// Resolve `id` to the stored key, failing if absent.
    fn node_key(&self, id: &str) -> GraphResult<NodeId> {
        self.nodes
            .get_key_value(id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    // ------------------------------------------------------------------
    // Node attributes
    // ------------------------------------------------------------------

    /// Merge attributes into a node.
    ///
    /// Only keys that are new (`NodeAttributesAdded`) or whose value changed
    /// (`NodeAttributesChanged`) are reported; equal values are silent no-ops.
    pub fn update_attributes<I, K>(&mut self, id: &str, attrs: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        let id = self.node_key(id)?;
        let updates = attributes::collect(attrs);
        let target = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        let merge = attributes::merge(target, updates);

        if !merge.added.is_empty() {
            self.emit(GraphEvent::NodeAttributesAdded {
                node: id.clone(),
                names: merge.added,
            });
        }
        if !merge.changed.is_empty() {
            self.emit(GraphEvent::NodeAttributesChanged {
                node: id,
                names: merge.changed,
            });
        }
        Ok(())
    }

    /// Set a single attribute.
    pub fn set_attribute(&mut self, id: &str, name: impl Into<String>, value: A) -> GraphResult<()> {
        self.update_attributes(id, [(name.into(), value)])
    }

    /// Remove an attribute, returning its value.
    pub fn delete_attribute(&mut self, id: &str, name: &str) -> GraphResult<A> {
        let id = self.node_key(id)?;
        if !self.nodes[&id].contains_key(name) {
            return Err(GraphError::AttributeNotFound {
                node: id,
                name: name.to_string(),
            });
        }
        self.emit(GraphEvent::NodeAttributesAboutToBeRemoved {
            node: id.clone(),
            names: vec![name.to_string()],
        });
        let value = self
            .nodes
            .get_mut(&id)
            .and_then(|attrs| attrs.shift_remove(name))
            .ok_or_else(|| GraphError::AttributeNotFound {
                node: id.clone(),
                name: name.to_string(),
            })?;
        self.emit(GraphEvent::NodeAttributesRemoved {
            node: id,
            names: vec![name.to_string()],
        });
        Ok(value)
    }

    /// Remove an attribute if present. Returns whether anything was removed.
    pub fn discard_attribute(&mut self, id: &str, name: &str) -> GraphResult<bool> {
        if !self.has_attribute(id, name) {
            self.node_key(id)?;
            return Ok(false);
        }
        self.delete_attribute(id, name).map(|_| true)
    }

    pub fn attribute(&self, id: &str, name: &str) -> GraphResult<&A> {
        self.attributes(id)?
            .get(name)
            .ok_or_else(|| GraphError::AttributeNotFound {
                node: id.into(),
                name: name.to_string(),
            })
    }

    /// Whether the node exists and has `name` set.
    pub fn has_attribute(&self, id: &str, name: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|attrs| attrs.contains_key(name))
    }

    pub fn attributes(&self, id: &str) -> GraphResult<&Attributes<A>> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Add an edge with no attributes. A missing key is synthesized.
    pub fn add_edge(&mut self, source: &str, target: &str, key: Option<EdgeKey>) -> GraphResult<EdgeId> {
        self.insert_edge(source, target, key, Attributes::new())
    }

    /// Add an edge with initial attributes.
    pub fn add_edge_with<I, K>(
        &mut self,
        source: &str,
        target: &str,
        key: Option<EdgeKey>,
        attrs: I,
    ) -> GraphResult<EdgeId>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        self.insert_edge(source, target, key, attributes::collect(attrs))
    }

    fn insert_edge(
        &mut self,
        source: &str,
        target: &str,
        key: Option<EdgeKey>,
        attrs: Attributes<A>,
    ) -> GraphResult<EdgeId> {
        if source == target {
            return Err(GraphError::SelfLoop(source.into()));
        }
        if !self.options.auto_create_nodes {
            self.node_key(source)?;
            self.node_key(target)?;
        }

        let key = match key {
            Some(key) => key,
            None => self.next_auto_key(source, target),
        };
        let edge = EdgeId::new(source, target, key);
        if self.edges.contains_key(&edge) {
            return Err(GraphError::DuplicateEdge(edge));
        }

        for endpoint in [source, target] {
            if !self.contains_node(endpoint) {
                self.insert_node(endpoint.into(), Attributes::new())?;
            }
        }

        let names: Vec<String> = attrs.keys().cloned().collect();
        self.edges.insert(edge.clone(), attrs);
        if let Some(out) = self.out_adj.get_mut(&edge.source) {
            out.insert(edge.clone());
        }
        if let Some(inc) = self.in_adj.get_mut(&edge.target) {
            inc.insert(edge.clone());
        }

        self.emit(GraphEvent::EdgesAdded(vec![edge.clone()]));
        if !names.is_empty() {
            self.emit(GraphEvent::EdgeAttributesAdded {
                edge: edge.clone(),
                names,
            });
        }
        Ok(edge)
    }

    fn next_auto_key(&mut self, source: &str, target: &str) -> EdgeKey {
        loop {
            let key = EdgeKey::Auto(self.next_key);
            self.next_key += 1;
            if !self.edges.contains_key(&EdgeId::new(source, target, key.clone())) {
                return key;
            }
        }
    }

    /// Remove an edge, returning its attributes.
    pub fn remove_edge(&mut self, edge: &EdgeId) -> GraphResult<Attributes<A>> {
        if !self.edges.contains_key(edge) {
            return Err(GraphError::EdgeNotFound(edge.clone()));
        }
        Ok(self.detach_edge(edge.clone()))
    }

    /// Remove an edge known to exist, with about-to-remove/removed events.
    fn detach_edge(&mut self, edge: EdgeId) -> Attributes<A> {
        self.emit(GraphEvent::EdgesAboutToBeRemoved(vec![edge.clone()]));
        if let Some(out) = self.out_adj.get_mut(&edge.source) {
            out.shift_remove(&edge);
        }
        if let Some(inc) = self.in_adj.get_mut(&edge.target) {
            inc.shift_remove(&edge);
        }
        let attrs = self.edges.shift_remove(&edge).unwrap_or_default();
        self.emit(GraphEvent::EdgesRemoved(vec![edge]));
        attrs
    }

    pub fn contains_edge(&self, edge: &EdgeId) -> bool {
        self.edges.contains_key(edge)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.edges.keys()
    }

    /// Edges ending at `id` (empty if the node does not exist).
    pub fn in_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a EdgeId> + use<'a, A> {
        self.in_adj.get(id).into_iter().flatten()
    }

    /// Edges starting at `id` (empty if the node does not exist).
    pub fn out_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a EdgeId> + use<'a, A> {
        self.out_adj.get(id).into_iter().flatten()
    }

    /// Distinct source nodes of edges ending at `id`.
    pub fn predecessors(&self, id: &str) -> IndexSet<&NodeId> {
        self.in_edges(id).map(|e| &e.source).collect()
    }

    /// Distinct target nodes of edges starting at `id`.
    pub fn successors(&self, id: &str) -> IndexSet<&NodeId> {
        self.out_edges(id).map(|e| &e.target).collect()
    }

    // ------------------------------------------------------------------
    // Edge attributes
    // ------------------------------------------------------------------

    pub fn update_edge_attributes<I, K>(&mut self, edge: &EdgeId, attrs: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
    {
        let updates = attributes::collect(attrs);
        let target = self
            .edges
            .get_mut(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(edge.clone()))?;
        let merge = attributes::merge(target, updates);

        if !merge.added.is_empty() {
            self.emit(GraphEvent::EdgeAttributesAdded {
                edge: edge.clone(),
                names: merge.added,
            });
        }
        if !merge.changed.is_empty() {
            self.emit(GraphEvent::EdgeAttributesChanged {
                edge: edge.clone(),
                names: merge.changed,
            });
        }
        Ok(())
    }

    pub fn delete_edge_attribute(&mut self, edge: &EdgeId, name: &str) -> GraphResult<A> {
        let attrs = self
            .edges
            .get(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(edge.clone()))?;
        if !attrs.contains_key(name) {
            return Err(GraphError::EdgeAttributeNotFound {
                edge: edge.clone(),
                name: name.to_string(),
            });
        }
        self.emit(GraphEvent::EdgeAttributesAboutToBeRemoved {
            edge: edge.clone(),
            names: vec![name.to_string()],
        });
        let value = self
            .edges
            .get_mut(edge)
            .and_then(|attrs| attrs.shift_remove(name))
            .ok_or_else(|| GraphError::EdgeAttributeNotFound {
                edge: edge.clone(),
                name: name.to_string(),
            })?;
        self.emit(GraphEvent::EdgeAttributesRemoved {
            edge: edge.clone(),
            names: vec![name.to_string()],
        });
        Ok(value)
    }

    pub fn edge_attribute(&self, edge: &EdgeId, name: &str) -> GraphResult<&A> {
        self.edge_attributes(edge)?
            .get(name)
            .ok_or_else(|| GraphError::EdgeAttributeNotFound {
                edge: edge.clone(),
                name: name.to_string(),
            })
    }

    pub fn edge_attributes(&self, edge: &EdgeId) -> GraphResult<&Attributes<A>> {
        self.edges
            .get(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(edge.clone()))
    }
}
