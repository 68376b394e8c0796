//! Evaluation, caching and invalidation through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fg_core::{NodeId, Value};
use fg_func::{ExecError, FuncError, Function, FunctionGraph, Param};
use fg_graph::{EventKind, GraphEvent};

fn none() -> Vec<(String, Value)> {
    Vec::new()
}

fn constant(value: i64) -> Function {
    Function::new("const", vec![], move |_| Ok(Value::from(value)))
}

fn add(name: &str) -> Function {
    Function::new(
        name,
        vec![Param::positional("a"), Param::positional("b").with_default()],
        |args| {
            let b = match args.get("b") {
                Some(_) => args.int("b")?,
                None => 0,
            };
            Ok(Value::from(args.int("a")? + b))
        },
    )
}

/// Passes its input through, failing while `fail` is set.
fn switchable(fail: Rc<Cell<bool>>) -> Function {
    Function::new("step", vec![Param::positional("x")], move |args| {
        if fail.get() {
            return Err(ExecError::Raised("step failed".into()));
        }
        Ok(args.require("x")?.clone())
    })
}

#[test]
fn read_file_then_upper_case() {
    let path = std::env::temp_dir().join(format!("fg-func-read-{}.txt", std::process::id()));
    std::fs::write(&path, "hello flow\n").unwrap();

    let read = Function::new("read", vec![Param::positional("path")], |args| {
        Ok(Value::from(std::fs::read_to_string(args.str("path")?)?))
    });
    let up = Function::new("up", vec![Param::positional("text")], |args| {
        Ok(Value::from(args.str("text")?.to_uppercase()))
    });

    let mut g = FunctionGraph::new();
    let read_id = g.add_function(read, none()).unwrap();
    let up_id = g.add_function(up, none()).unwrap();
    assert_eq!(read_id, NodeId::from("read1"));
    assert_eq!(up_id, NodeId::from("up1"));

    g.connect(&read_id, "out", &up_id, "text").unwrap();
    g.set_parameter_value(&read_id, "path", path.to_string_lossy().into_owned())
        .unwrap();

    let report = g.evaluate(&up_id).unwrap();
    assert!(report.succeeded());
    assert_eq!(g.cache(&read_id).unwrap(), &Value::from("hello flow\n"));
    assert_eq!(g.cache(&up_id).unwrap(), &Value::from("HELLO FLOW\n"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_recorded_not_returned() {
    let read = Function::new("read", vec![Param::positional("path")], |args| {
        Ok(Value::from(std::fs::read_to_string(args.str("path")?)?))
    });
    let mut g = FunctionGraph::new();
    let id = g
        .add_function(read, [("path", Value::from("/nonexistent/fg-func/input.txt"))])
        .unwrap();

    let report = g.evaluate(&id).unwrap();
    assert_eq!(report.failed, Some(id.clone()));
    assert!(matches!(g.error(&id), Ok(ExecError::Raised(_))));
    assert!(matches!(g.cache(&id), Err(FuncError::NotEvaluated { .. })));
}

#[test]
fn edge_value_overrides_stored_parameter() {
    let mut g = FunctionGraph::new();
    let source = g.add_function(constant(1), none()).unwrap();
    let sum = g
        .add_function(add("add"), [("a", Value::from(100)), ("b", Value::from(10))])
        .unwrap();
    g.connect(&source, "out", &sum, "a").unwrap();

    g.evaluate(&sum).unwrap();
    assert_eq!(g.cache(&sum).unwrap(), &Value::from(11));
}

#[test]
fn failure_short_circuits_linear_chain() {
    let fail = Rc::new(Cell::new(false));
    let mut g = FunctionGraph::new();
    g.insert_function("A", constant(7), none()).unwrap();
    g.insert_function("B", switchable(Rc::clone(&fail)), none()).unwrap();
    g.insert_function("C", add("add"), none()).unwrap();
    g.connect("A", "out", "B", "x").unwrap();
    g.connect("B", "out", "C", "a").unwrap();

    // A clean pass first, so C holds a result that becomes stale.
    g.evaluate("C").unwrap();
    assert_eq!(g.cache("C").unwrap(), &Value::from(7));

    fail.set(true);
    let report = g.evaluate("C").unwrap();
    assert_eq!(report.failed, Some(NodeId::from("B")));
    assert_eq!(report.skipped, vec![NodeId::from("C")]);

    assert_eq!(g.cache("A").unwrap(), &Value::from(7));
    assert!(g.error("A").is_err());
    assert_eq!(g.error("B").unwrap(), &ExecError::Raised("step failed".into()));
    assert!(g.cache("B").is_err());
    assert!(g.cache("C").is_err());
    assert!(g.error("C").is_err());

    // Recovery clears the error.
    fail.set(false);
    assert!(g.evaluate("C").unwrap().succeeded());
    assert!(g.error("B").is_err());
    assert_eq!(g.cache("C").unwrap(), &Value::from(7));
}

#[test]
fn failure_stops_independent_branches_too() {
    let fail = Rc::new(Cell::new(true));
    let mut g = FunctionGraph::new();
    g.insert_function("bad", switchable(fail), [("x", Value::from(1))])
        .unwrap();
    g.insert_function("good", constant(2), none()).unwrap();
    g.insert_function("sum", add("add"), none()).unwrap();
    g.connect("bad", "out", "sum", "a").unwrap();
    g.connect("good", "out", "sum", "b").unwrap();

    let report = g.evaluate("sum").unwrap();
    assert_eq!(report.failed, Some(NodeId::from("bad")));
    assert_eq!(report.skipped, vec![NodeId::from("good"), NodeId::from("sum")]);
    assert!(report.evaluated.is_empty());
    assert!(g.cache("good").is_err());
}

#[test]
fn only_ancestors_are_evaluated() {
    let calls = Rc::new(Cell::new(0));
    let counted = {
        let calls = Rc::clone(&calls);
        Function::new("counted", vec![], move |_| {
            calls.set(calls.get() + 1);
            Ok(Value::from(1))
        })
    };

    let mut g = FunctionGraph::new();
    let a = g.add_function(counted.clone(), none()).unwrap();
    let b = g.add_function(add("add"), none()).unwrap();
    let unrelated = g.add_function(counted, none()).unwrap();
    g.connect(&a, "out", &b, "a").unwrap();

    let report = g.evaluate(&b).unwrap();
    assert_eq!(report.order, vec![a, b]);
    assert_eq!(calls.get(), 1);
    assert!(g.cache(&unrelated).is_err());
}

#[test]
fn invalidation_reaches_exactly_target_and_descendants() {
    //   a -> b -> c -> e
    //        b -> d -> e
    //   f (unrelated)
    let mut g = FunctionGraph::new();
    for id in ["a", "f"] {
        g.insert_function(id, constant(1), none()).unwrap();
    }
    for id in ["b", "c", "d", "e"] {
        g.insert_function(id, add("add"), none()).unwrap();
    }
    g.connect("a", "out", "b", "a").unwrap();
    g.connect("b", "out", "c", "a").unwrap();
    g.connect("b", "out", "d", "a").unwrap();
    g.connect("c", "out", "e", "a").unwrap();
    g.connect("d", "out", "e", "b").unwrap();

    assert!(g.evaluate("e").unwrap().succeeded());
    g.evaluate("f").unwrap();
    assert_eq!(g.cache("e").unwrap(), &Value::from(2));

    let visited = g.invalidate("b").unwrap();
    let names: Vec<&str> = visited.iter().map(NodeId::as_str).collect();
    assert_eq!(names, vec!["b", "c", "d", "e"]);

    for id in ["b", "c", "d", "e"] {
        assert!(g.cache(id).is_err(), "{} should be cleared", id);
    }
    for id in ["a", "f"] {
        assert!(g.cache(id).is_ok(), "{} should keep its cache", id);
    }
}

#[test]
fn invalidation_clears_errors() {
    let mut g = FunctionGraph::new();
    g.insert_function("n", switchable(Rc::new(Cell::new(true))), [("x", Value::Null)])
        .unwrap();
    g.evaluate("n").unwrap();
    assert!(g.error("n").is_ok());

    g.invalidate("n").unwrap();
    assert!(g.error("n").is_err());
    // Nothing left to clear is not an error.
    g.invalidate("n").unwrap();
}

#[test]
fn evaluation_order_attribute_tracks_position() {
    let mut g = FunctionGraph::new();
    g.insert_function("z", constant(1), none()).unwrap();
    g.insert_function("y", add("add"), none()).unwrap();
    g.insert_function("x", add("add"), none()).unwrap();
    g.connect("z", "out", "y", "a").unwrap();
    g.connect("y", "out", "x", "a").unwrap();

    g.evaluate("x").unwrap();
    assert_eq!(g.evaluation_order("z").unwrap(), 0);
    assert_eq!(g.evaluation_order("y").unwrap(), 1);
    assert_eq!(g.evaluation_order("x").unwrap(), 2);
}

#[test]
fn evaluation_publishes_result_events() {
    let mut g = FunctionGraph::new();
    let id = g.add_function(constant(5), none()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    g.subscribe(EventKind::NodeAttributesAdded, move |event, _| {
        if let GraphEvent::NodeAttributesAdded { names, .. } = event {
            sink.borrow_mut().extend(names.iter().cloned());
        }
    });

    g.evaluate(&id).unwrap();
    assert_eq!(*seen.borrow(), vec!["evaluation_order".to_string(), "cache".to_string()]);

    // Same result again: nothing new is added or changed.
    seen.borrow_mut().clear();
    g.evaluate(&id).unwrap();
    assert!(seen.borrow().is_empty());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn reevaluation_after_invalidate_is_deterministic(
            seed in -1000i64..1000,
            increments in prop::collection::vec(-50i64..50, 1..6),
        ) {
            let mut g = FunctionGraph::new();
            let mut previous = g.add_function(constant(seed), none()).unwrap();
            for step in &increments {
                let id = g.add_function(add("add"), [("b", Value::from(*step))]).unwrap();
                g.connect(&previous, "out", &id, "a").unwrap();
                previous = id;
            }

            g.evaluate(&previous).unwrap();
            let first = g.cache(&previous).unwrap().clone();
            g.invalidate(&previous).unwrap();
            prop_assert!(g.cache(&previous).is_err());
            g.evaluate(&previous).unwrap();

            prop_assert_eq!(g.cache(&previous).unwrap(), &first);
            prop_assert_eq!(first, Value::from(seed + increments.iter().sum::<i64>()));
        }
    }
}
