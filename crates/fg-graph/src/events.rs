//! Change notification channel.
//!
//! Every graph owns its own subscriber list. Events are delivered
//! synchronously, in emission order, to each subscriber whose filter matches.
//! "About to be removed" events are emitted while the entity is still present;
//! all other events are emitted after the change has been applied.

use core::fmt;

use fg_core::{EdgeId, NodeId};

use crate::multigraph::AttributedMultigraph;

/// A change to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    NodesAdded(Vec<NodeId>),
    NodesAboutToBeRemoved(Vec<NodeId>),
    NodesRemoved(Vec<NodeId>),
    NodeAttributesAdded { node: NodeId, names: Vec<String> },
    NodeAttributesChanged { node: NodeId, names: Vec<String> },
    NodeAttributesAboutToBeRemoved { node: NodeId, names: Vec<String> },
    NodeAttributesRemoved { node: NodeId, names: Vec<String> },
    EdgesAdded(Vec<EdgeId>),
    EdgesAboutToBeRemoved(Vec<EdgeId>),
    EdgesRemoved(Vec<EdgeId>),
    EdgeAttributesAdded { edge: EdgeId, names: Vec<String> },
    EdgeAttributesChanged { edge: EdgeId, names: Vec<String> },
    EdgeAttributesAboutToBeRemoved { edge: EdgeId, names: Vec<String> },
    EdgeAttributesRemoved { edge: EdgeId, names: Vec<String> },
}

/// Discriminant of [`GraphEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodesAdded,
    NodesAboutToBeRemoved,
    NodesRemoved,
    NodeAttributesAdded,
    NodeAttributesChanged,
    NodeAttributesAboutToBeRemoved,
    NodeAttributesRemoved,
    EdgesAdded,
    EdgesAboutToBeRemoved,
    EdgesRemoved,
    EdgeAttributesAdded,
    EdgeAttributesChanged,
    EdgeAttributesAboutToBeRemoved,
    EdgeAttributesRemoved,
}

impl GraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GraphEvent::NodesAdded(_) => EventKind::NodesAdded,
            GraphEvent::NodesAboutToBeRemoved(_) => EventKind::NodesAboutToBeRemoved,
            GraphEvent::NodesRemoved(_) => EventKind::NodesRemoved,
            GraphEvent::NodeAttributesAdded { .. } => EventKind::NodeAttributesAdded,
            GraphEvent::NodeAttributesChanged { .. } => EventKind::NodeAttributesChanged,
            GraphEvent::NodeAttributesAboutToBeRemoved { .. } => {
                EventKind::NodeAttributesAboutToBeRemoved
            }
            GraphEvent::NodeAttributesRemoved { .. } => EventKind::NodeAttributesRemoved,
            GraphEvent::EdgesAdded(_) => EventKind::EdgesAdded,
            GraphEvent::EdgesAboutToBeRemoved(_) => EventKind::EdgesAboutToBeRemoved,
            GraphEvent::EdgesRemoved(_) => EventKind::EdgesRemoved,
            GraphEvent::EdgeAttributesAdded { .. } => EventKind::EdgeAttributesAdded,
            GraphEvent::EdgeAttributesChanged { .. } => EventKind::EdgeAttributesChanged,
            GraphEvent::EdgeAttributesAboutToBeRemoved { .. } => {
                EventKind::EdgeAttributesAboutToBeRemoved
            }
            GraphEvent::EdgeAttributesRemoved { .. } => EventKind::EdgeAttributesRemoved,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscriber callback.
///
/// The graph is passed by shared reference: a subscriber can query the graph
/// (including an entity that is about to be removed) but cannot mutate it.
pub type Callback<A> = Box<dyn FnMut(&GraphEvent, &AttributedMultigraph<A>)>;

pub(crate) struct Subscription<A> {
    id: SubscriptionId,
    /// `None` receives every event.
    filter: Option<EventKind>,
    callback: Callback<A>,
}

/// Per-graph subscriber list.
pub(crate) struct ChangeChannel<A> {
    subscriptions: Vec<Subscription<A>>,
    next_id: u64,
}

impl<A> ChangeChannel<A> {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn subscribe(&mut self, filter: Option<EventKind>, callback: Callback<A>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            filter,
            callback,
        });
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Detach the subscriber list so it can be driven while the graph is borrowed.
    pub(crate) fn take(&mut self) -> Vec<Subscription<A>> {
        std::mem::take(&mut self.subscriptions)
    }

    pub(crate) fn restore(&mut self, subscriptions: Vec<Subscription<A>>) {
        debug_assert!(self.subscriptions.is_empty());
        self.subscriptions = subscriptions;
    }
}

impl<A> Subscription<A> {
    pub(crate) fn deliver(&mut self, event: &GraphEvent, graph: &AttributedMultigraph<A>) {
        if self.filter.is_none_or(|kind| kind == event.kind()) {
            (self.callback)(event, graph);
        }
    }
}

impl<A> fmt::Debug for ChangeChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
