//! Integration tests for fg-graph.

use std::cell::RefCell;
use std::rc::Rc;

use fg_core::{EdgeId, EdgeKey, GraphOptions, NodeId, Value};
use fg_graph::{AttributedMultigraph, EventKind, GraphError, GraphEvent, PortedGraph};

type Events = Rc<RefCell<Vec<GraphEvent>>>;

fn record<A: fg_graph::AttributeValue + 'static>(graph: &mut AttributedMultigraph<A>) -> Events {
    let log: Events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    graph.subscribe_all(move |event, _| sink.borrow_mut().push(event.clone()));
    log
}

#[test]
fn repeated_update_emits_once() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node("n").unwrap();
    let log = record(&mut g);

    g.update_attributes("n", [("k", Value::from(1))]).unwrap();
    g.update_attributes("n", [("k", Value::from(1))]).unwrap();
    assert_eq!(log.borrow().len(), 1);

    g.update_attributes("n", [("k", Value::from(2))]).unwrap();
    assert_eq!(
        log.borrow().last(),
        Some(&GraphEvent::NodeAttributesChanged {
            node: "n".into(),
            names: vec!["k".into()],
        })
    );
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn mixed_update_reports_added_and_changed_separately() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node_with("n", [("a", Value::from(1)), ("b", Value::from(2))])
        .unwrap();
    let log = record(&mut g);

    g.update_attributes(
        "n",
        [("a", Value::from(1)), ("b", Value::from(5)), ("c", Value::from(9))],
    )
    .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            GraphEvent::NodeAttributesAdded {
                node: "n".into(),
                names: vec!["c".into()],
            },
            GraphEvent::NodeAttributesChanged {
                node: "n".into(),
                names: vec!["b".into()],
            },
        ]
    );
}

#[test]
fn removing_node_cascades_to_incident_edges() {
    let mut g: PortedGraph<Value> = PortedGraph::new();
    for id in ["a", "b", "c"] {
        g.add_node(id).unwrap();
    }
    g.connect("a", "out", "b", "x").unwrap();
    g.connect("b", "out", "c", "x").unwrap();
    g.connect("a", "out", "c", "y").unwrap();

    g.remove_node("b").unwrap();

    assert!(!g.contains_node("b"));
    assert_eq!(g.base().edge_count(), 1);
    assert!(g.out_edges("a", None).all(|e| e.target.as_str() != "b"));
    assert!(g.in_edges("c", None).all(|e| e.source.as_str() != "b"));
    assert!(g.edges().all(|e| !e.touches(&NodeId::from("b"))));
}

#[test]
fn node_removal_event_order() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node("a").unwrap();
    g.add_node("b").unwrap();
    let edge = g.add_edge("a", "b", None).unwrap();
    let log = record(&mut g);

    g.remove_node("a").unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            GraphEvent::NodesAboutToBeRemoved(vec!["a".into()]),
            GraphEvent::EdgesAboutToBeRemoved(vec![edge.clone()]),
            GraphEvent::EdgesRemoved(vec![edge]),
            GraphEvent::NodesRemoved(vec!["a".into()]),
        ]
    );
}

#[test]
fn about_to_remove_subscriber_still_sees_node() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node_with("a", [("label", Value::from("hello"))]).unwrap();

    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    g.subscribe(EventKind::NodesAboutToBeRemoved, move |event, graph| {
        if let GraphEvent::NodesAboutToBeRemoved(ids) = event {
            let label = graph.attribute(&ids[0], "label").ok().cloned();
            *sink.borrow_mut() = label;
        }
    });

    let gone = Rc::new(RefCell::new(true));
    let gone_sink = Rc::clone(&gone);
    g.subscribe(EventKind::NodesRemoved, move |event, graph| {
        if let GraphEvent::NodesRemoved(ids) = event {
            *gone_sink.borrow_mut() = !graph.contains_node(&ids[0]);
        }
    });

    g.remove_node("a").unwrap();
    assert_eq!(*seen.borrow(), Some(Value::from("hello")));
    assert!(*gone.borrow());
}

#[test]
fn attribute_delete_events_bracket_removal() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node_with("a", [("x", Value::from(1))]).unwrap();

    let present = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&present);
    g.subscribe_all(move |event, graph| {
        sink.borrow_mut()
            .push((event.kind(), graph.has_attribute("a", "x")));
    });

    g.delete_attribute("a", "x").unwrap();
    assert_eq!(
        *present.borrow(),
        vec![
            (EventKind::NodeAttributesAboutToBeRemoved, true),
            (EventKind::NodeAttributesRemoved, false),
        ]
    );
}

#[test]
fn duplicate_edge_is_rejected() {
    let mut g: PortedGraph<Value> = PortedGraph::new();
    g.add_node("a").unwrap();
    g.add_node("b").unwrap();
    let edge = g.connect("a", "out", "b", "x").unwrap();

    assert_eq!(
        g.connect("a", "out", "b", "x"),
        Err(GraphError::DuplicateEdge(edge))
    );
    assert_eq!(g.base().edge_count(), 1);

    // Same pair, different key is a legitimate parallel edge.
    g.connect("a", "out", "b", "y").unwrap();
    assert_eq!(g.base().edge_count(), 2);
}

#[test]
fn endpoints_must_exist_by_default() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    g.add_node("a").unwrap();
    assert_eq!(
        g.add_edge("a", "ghost", None),
        Err(GraphError::NodeNotFound("ghost".into()))
    );
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn auto_create_is_opt_in() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::with_options(GraphOptions {
        auto_create_nodes: true,
    });
    let log = record(&mut g);

    let edge = g.add_edge("a", "b", Some(EdgeKey::Name("k".into()))).unwrap();
    assert!(g.contains_node("a"));
    assert!(g.contains_node("b"));
    assert!(g.attributes("a").unwrap().is_empty());
    assert_eq!(
        *log.borrow(),
        vec![
            GraphEvent::NodesAdded(vec!["a".into()]),
            GraphEvent::NodesAdded(vec!["b".into()]),
            GraphEvent::EdgesAdded(vec![edge]),
        ]
    );
}

#[test]
fn rejected_edge_leaves_graph_untouched_even_with_auto_create() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::with_options(GraphOptions {
        auto_create_nodes: true,
    });
    assert_eq!(g.add_edge("a", "a", None), Err(GraphError::SelfLoop("a".into())));
    assert_eq!(g.node_count(), 0);
}

#[test]
fn edges_iterate_in_insertion_order() {
    let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
    for id in ["a", "b", "c"] {
        g.add_node(id).unwrap();
    }
    let e1 = g.add_edge("b", "c", None).unwrap();
    let e2 = g.add_edge("a", "c", None).unwrap();
    let e3 = g.add_edge("a", "b", None).unwrap();

    let all: Vec<&EdgeId> = g.edges().collect();
    assert_eq!(all, vec![&e1, &e2, &e3]);
    let into_c: Vec<&EdgeId> = g.in_edges("c").collect();
    assert_eq!(into_c, vec![&e1, &e2]);

    let preds: Vec<&str> = g.predecessors("c").into_iter().map(|n| n.as_str()).collect();
    assert_eq!(preds, vec!["b", "a"]);
    let succs: Vec<&str> = g.successors("a").into_iter().map(|n| n.as_str()).collect();
    assert_eq!(succs, vec!["c", "b"]);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn name() -> impl Strategy<Value = String> {
        "[a-z]{0,6}"
    }

    proptest! {
        #[test]
        fn port_keys_always_accepted(outlet in name(), inlet in name()) {
            let mut g: PortedGraph<Value> = PortedGraph::new();
            g.add_node("u").unwrap();
            g.add_node("v").unwrap();
            let edge = g.add_edge("u", "v", EdgeKey::ports(outlet.clone(), inlet.clone())).unwrap();
            prop_assert_eq!(edge.key.outlet(), Some(outlet.as_str()));
            prop_assert_eq!(edge.key.inlet(), Some(inlet.as_str()));
        }

        #[test]
        fn bare_keys_always_rejected(bare in name(), auto in any::<u64>()) {
            let mut g: PortedGraph<Value> = PortedGraph::new();
            g.add_node("u").unwrap();
            g.add_node("v").unwrap();
            prop_assert!(g.add_edge("u", "v", EdgeKey::Name(bare)).is_err());
            prop_assert!(g.add_edge("u", "v", EdgeKey::Auto(auto)).is_err());
            prop_assert_eq!(g.base().edge_count(), 0);
        }

        #[test]
        fn self_loops_always_rejected(outlet in name(), inlet in name()) {
            let mut g: PortedGraph<Value> = PortedGraph::new();
            g.add_node("u").unwrap();
            let result = g.connect("u", &outlet, "u", &inlet);
            prop_assert_eq!(result, Err(GraphError::SelfLoop("u".into())));
            prop_assert_eq!(g.base().edge_count(), 0);
        }

        #[test]
        fn topological_order_respects_every_edge(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
        ) {
            // Only forward edges (i < j) so the graph is acyclic.
            let mut g: AttributedMultigraph<Value> = AttributedMultigraph::new();
            for i in 0..8 {
                g.add_node(format!("n{}", i)).unwrap();
            }
            for (a, b) in edges {
                if a < b {
                    g.add_edge(&format!("n{}", a), &format!("n{}", b), None).unwrap();
                }
            }
            let order = g.full_topological_order().unwrap();
            prop_assert_eq!(order.len(), 8);
            let pos = |id: &NodeId| order.iter().position(|n| n == id).unwrap();
            for edge in g.edges() {
                prop_assert!(pos(&edge.source) < pos(&edge.target));
            }
        }
    }
}
