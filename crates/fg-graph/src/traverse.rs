//! Reachability and ordering queries.

use std::collections::{HashMap, VecDeque};

use fg_core::NodeId;
use indexmap::IndexSet;

use crate::attributes::AttributeValue;
use crate::error::{GraphError, GraphResult};
use crate::multigraph::AttributedMultigraph;

#[derive(Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

impl<A: AttributeValue> AttributedMultigraph<A> {
    /// Nodes from which `id` is reachable, excluding `id` itself.
    ///
    /// Ordered by breadth-first discovery.
    pub fn ancestors(&self, id: &str) -> GraphResult<IndexSet<NodeId>> {
        self.reach(id, Direction::Upstream)
    }

    /// Nodes reachable from `id`, excluding `id` itself.
    ///
    /// Ordered by breadth-first discovery.
    pub fn descendants(&self, id: &str) -> GraphResult<IndexSet<NodeId>> {
        self.reach(id, Direction::Downstream)
    }

    fn reach(&self, id: &str, direction: Direction) -> GraphResult<IndexSet<NodeId>> {
        if !self.contains_node(id) {
            return Err(GraphError::NodeNotFound(id.into()));
        }
        let mut seen: IndexSet<NodeId> = IndexSet::new();
        let mut queue: VecDeque<&NodeId> = VecDeque::new();

        queue.extend(self.neighbours(id, direction));
        while let Some(node) = queue.pop_front() {
            if node.as_str() == id || seen.contains(node) {
                continue;
            }
            seen.insert(node.clone());
            queue.extend(self.neighbours(node, direction));
        }
        Ok(seen)
    }

    fn neighbours(&self, node: &str, direction: Direction) -> Vec<&NodeId> {
        match direction {
            Direction::Upstream => self.in_edges(node).map(|e| &e.source).collect(),
            Direction::Downstream => self.out_edges(node).map(|e| &e.target).collect(),
        }
    }

    /// Topological order of the subgraph induced by `subset`.
    ///
    /// Only edges with both endpoints in `subset` are considered. Ties are
    /// broken by the order of `subset`, so the result is deterministic.
    /// Fails with [`GraphError::Cycle`] if the induced subgraph has a cycle, or
    /// [`GraphError::NodeNotFound`] if `subset` names an unknown node.
    pub fn topological_order(&self, subset: &IndexSet<NodeId>) -> GraphResult<Vec<NodeId>> {
        let mut in_degree: HashMap<&NodeId, usize> = HashMap::with_capacity(subset.len());
        for id in subset {
            if !self.contains_node(id) {
                return Err(GraphError::NodeNotFound(id.clone()));
            }
            let degree = self
                .in_edges(id)
                .filter(|e| subset.contains(&e.source))
                .count();
            in_degree.insert(id, degree);
        }

        // Kahn's algorithm
        let mut queue: VecDeque<&NodeId> = subset
            .iter()
            .filter(|id| in_degree[id] == 0)
            .collect();
        let mut order = Vec::with_capacity(subset.len());

        while let Some(id) = queue.pop_front() {
            order.push(id.clone());
            for edge in self.out_edges(id) {
                if let Some(degree) = in_degree.get_mut(&edge.target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }

        if order.len() != subset.len() {
            let nodes = subset
                .iter()
                .filter(|id| in_degree[id] > 0)
                .cloned()
                .collect();
            return Err(GraphError::Cycle { nodes });
        }
        Ok(order)
    }

    /// Topological order of the whole graph.
    pub fn full_topological_order(&self) -> GraphResult<Vec<NodeId>> {
        let all: IndexSet<NodeId> = self.nodes().cloned().collect();
        self.topological_order(&all)
    }
}
