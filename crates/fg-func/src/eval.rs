//! Evaluation and invalidation.
//!
//! `evaluate(target)` runs the target and all of its ancestors in topological
//! order. Each node's arguments come from the cached results of its upstream
//! nodes (bound by inlet name) and, for parameters no edge feeds, from the
//! node's stored parameter values. The first failing node stops the pass:
//! its error is recorded, nodes downstream of it lose their stale results,
//! and nothing after it in the order runs.

use fg_core::timing::Timer;
use fg_core::{NodeId, Value};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::attr::{self, Attr};
use crate::error::{ExecError, FuncResult};
use crate::function::{NestedGraph, NodeFunction};
use crate::graph::FunctionGraph;

/// Summary of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    /// Topological order of the target and its ancestors.
    pub order: Vec<NodeId>,
    /// Nodes invoked successfully, in order.
    pub evaluated: Vec<NodeId>,
    /// Node whose invocation failed, if any.
    pub failed: Option<NodeId>,
    /// Nodes of the order that were not reached.
    pub skipped: Vec<NodeId>,
    /// Wall-clock milliseconds per invoked node, when timing is enabled.
    pub timings_ms: IndexMap<NodeId, f64>,
}

impl EvalReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_none()
    }
}

impl FunctionGraph {
    /// Clear `cache` and `error` on `id` and every descendant.
    ///
    /// Returns the nodes visited, target first, each exactly once.
    pub fn invalidate(&mut self, id: &str) -> FuncResult<Vec<NodeId>> {
        let descendants = self.graph.base().descendants(id)?;
        let mut visited = Vec::with_capacity(descendants.len() + 1);
        visited.push(NodeId::from(id));
        visited.extend(descendants);

        for node in &visited {
            self.clear_results(node)?;
            debug!(node = %node, "invalidated");
        }
        Ok(visited)
    }

    /// Evaluate `id` and its ancestors.
    ///
    /// Structural problems (unknown node, cycle, node without a function) are
    /// returned before anything runs. Execution failures are recorded on the
    /// failing node and reported through [`EvalReport::failed`].
    pub fn evaluate(&mut self, id: &str) -> FuncResult<EvalReport> {
        let mut deps: IndexSet<NodeId> = self.graph.base().ancestors(id)?;
        deps.insert(NodeId::from(id));
        let order = self.graph.base().topological_order(&deps)?;

        let functions = order
            .iter()
            .map(|node| self.function(node))
            .collect::<FuncResult<Vec<_>>>()?;

        let record_order = self.options.record_order;
        let timing = self.options.timing_enabled();
        let mut report = EvalReport {
            order: order.clone(),
            ..EvalReport::default()
        };

        for (position, (node, function)) in order.iter().zip(functions).enumerate() {
            if record_order {
                self.graph.update_attributes(
                    node,
                    [(attr::EVALUATION_ORDER, Attr::Value(Value::from(position)))],
                )?;
            }

            let timer = Timer::start(timing);
            let outcome = self.run_node(node, &function);
            if let Some(ms) = timer.stop_ms() {
                report.timings_ms.insert(node.clone(), ms);
            }

            match outcome {
                Ok(value) => {
                    debug!(node = %node, position, "evaluated");
                    self.record(node, Ok(value))?;
                    report.evaluated.push(node.clone());
                }
                Err(err) => {
                    warn!(node = %node, error = %err, "evaluation failed");
                    self.record(node, Err(err))?;
                    report.failed = Some(node.clone());
                    report.skipped = order[position + 1..].to_vec();
                    self.clear_downstream(node, &report.skipped)?;
                    break;
                }
            }
        }
        Ok(report)
    }

    /// Drop results of `skipped` nodes that depend on `failed`.
    fn clear_downstream(&mut self, failed: &str, skipped: &[NodeId]) -> FuncResult<()> {
        let downstream = self.graph.base().descendants(failed)?;
        for node in skipped.iter().filter(|n| downstream.contains(*n)) {
            self.clear_results(node)?;
        }
        Ok(())
    }

    fn run_node(&self, node: &str, function: &NodeFunction) -> Result<Value, ExecError> {
        let bound = self.bind_arguments(node, function)?;
        match function {
            NodeFunction::Plain(f) => {
                let args = f.bind(bound)?;
                f.call(&args)
            }
            NodeFunction::Nested(graph) => evaluate_nested(graph, bound),
        }
    }

    /// Collect named arguments: edge values first, then stored parameters for
    /// anything still unbound.
    fn bind_arguments(&self, node: &str, function: &NodeFunction) -> Result<IndexMap<String, Value>, ExecError> {
        let mut bound = IndexMap::new();

        for edge in self.graph.in_edges(node, None) {
            let Some(inlet) = edge.key.inlet() else {
                continue;
            };
            let value = self
                .cache(&edge.source)
                .map_err(|_| ExecError::MissingUpstream {
                    node: edge.source.clone(),
                    inlet: inlet.to_string(),
                })?;
            bound.insert(inlet.to_string(), value.clone());
        }

        let declared = match function {
            NodeFunction::Plain(f) => f.inlet_names(),
            NodeFunction::Nested(graph) => graph
                .try_borrow()
                .map(|g| g.inputs().keys().cloned().collect::<Vec<_>>())
                .map_err(|_| busy(graph))?,
        };
        for name in declared {
            if bound.contains_key(&name) {
                continue;
            }
            if let Ok(value) = self.parameter_value(node, &name) {
                bound.insert(name, value.clone());
            }
        }
        Ok(bound)
    }
}

/// An inner parameter displaced by an outer argument for one nested pass.
struct SavedInput {
    node: NodeId,
    inlet: String,
    previous: Option<Value>,
}

/// Feed `bound` into the nested graph's inputs and evaluate its output node.
///
/// The inner graph's own parameter values are restored afterwards, on
/// success and on failure.
fn evaluate_nested(graph: &NestedGraph, bound: IndexMap<String, Value>) -> Result<Value, ExecError> {
    let mut inner = graph.try_borrow_mut().map_err(|_| busy(graph))?;
    let name = inner.name().unwrap_or("graph").to_string();
    let fail = |reason: String| ExecError::Subgraph {
        graph: name.clone(),
        reason,
    };

    let mut saved = Vec::new();
    let outcome = bind_inputs(&mut inner, bound, &mut saved, &fail).and_then(|()| run_output(&mut inner, &fail));
    let restored = restore_inputs(&mut inner, saved);

    let value = outcome?;
    restored.map_err(|e| fail(e.to_string()))?;
    Ok(value)
}

fn bind_inputs(
    inner: &mut FunctionGraph,
    bound: IndexMap<String, Value>,
    saved: &mut Vec<SavedInput>,
    fail: &dyn Fn(String) -> ExecError,
) -> Result<(), ExecError> {
    for (input, value) in bound {
        let (node, inlet) = inner
            .inputs()
            .get(&input)
            .cloned()
            .ok_or_else(|| ExecError::UnexpectedArgument(input.clone()))?;
        let previous = inner.parameter_value(&node, &inlet).ok().cloned();
        inner
            .set_parameter_value(&node, &inlet, value)
            .map_err(|e| fail(e.to_string()))?;
        // Two inputs may feed the same inlet; keep the oldest value.
        if !saved.iter().any(|s| s.node == node && s.inlet == inlet) {
            saved.push(SavedInput {
                node: node.clone(),
                inlet,
                previous,
            });
        }
        inner.invalidate(&node).map_err(|e| fail(e.to_string()))?;
    }
    Ok(())
}

/// Put back the parameter values displaced by [`bind_inputs`] and drop the
/// inner results computed from the outer arguments.
fn restore_inputs(inner: &mut FunctionGraph, saved: Vec<SavedInput>) -> FuncResult<()> {
    for SavedInput { node, inlet, previous } in saved.into_iter().rev() {
        match previous {
            Some(value) => inner.set_parameter_value(&node, &inlet, value)?,
            None => {
                inner.delete_parameter_value(&node, &inlet)?;
            }
        }
        inner.invalidate(&node)?;
    }
    Ok(())
}

fn run_output(inner: &mut FunctionGraph, fail: &dyn Fn(String) -> ExecError) -> Result<Value, ExecError> {
    let output = inner
        .output()
        .cloned()
        .ok_or_else(|| fail("no output node".to_string()))?;
    let report = inner.evaluate(&output).map_err(|e| fail(e.to_string()))?;

    if let Some(failed) = report.failed {
        let reason = match inner.error(&failed) {
            Ok(err) => format!("node '{}': {}", failed, err),
            Err(_) => format!("node '{}' failed", failed),
        };
        return Err(fail(reason));
    }
    inner
        .cache(&output)
        .cloned()
        .map_err(|e| fail(e.to_string()))
}

/// A nested graph that is already borrowed, typically because it is being
/// evaluated further up the stack.
fn busy(graph: &NestedGraph) -> ExecError {
    let name = graph
        .try_borrow()
        .ok()
        .and_then(|g| g.name().map(str::to_string))
        .unwrap_or_else(|| "graph".to_string());
    ExecError::Subgraph {
        graph: name,
        reason: "graph is already being evaluated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FuncError;
    use crate::function::{Function, Param};
    use fg_graph::GraphError;

    fn constant(value: i64) -> Function {
        Function::new("const", vec![], move |_| Ok(Value::from(value)))
    }

    fn add_one() -> Function {
        Function::new("inc", vec![Param::positional("x")], |args| {
            Ok(Value::from(args.int("x")? + 1))
        })
    }

    fn none() -> [(&'static str, Value); 0] {
        []
    }

    #[test]
    fn chain_evaluates_in_order() {
        let mut g = FunctionGraph::new();
        let a = g.add_function(constant(1), none()).unwrap();
        let b = g.add_function(add_one(), none()).unwrap();
        g.connect(&a, "out", &b, "x").unwrap();

        let report = g.evaluate(&b).unwrap();
        assert!(report.succeeded());
        assert_eq!(report.order, vec![a.clone(), b.clone()]);
        assert_eq!(g.cache(&b).unwrap(), &Value::from(2));
        assert_eq!(g.evaluation_order(&a).unwrap(), 0);
        assert_eq!(g.evaluation_order(&b).unwrap(), 1);
    }

    #[test]
    fn node_without_function_is_structural() {
        let mut g = FunctionGraph::new();
        g.add_node("plain").unwrap();
        assert_eq!(g.evaluate("plain"), Err(FuncError::NoFunction("plain".into())));
        assert!(matches!(
            g.evaluate("ghost"),
            Err(FuncError::Graph(GraphError::NodeNotFound(_)))
        ));
    }

    #[test]
    fn cycle_is_reported_before_running() {
        let mut g = FunctionGraph::new();
        let a = g.add_function(add_one(), none()).unwrap();
        let b = g.add_function(add_one(), none()).unwrap();
        g.connect(&a, "out", &b, "x").unwrap();
        g.connect(&b, "out", &a, "x").unwrap();

        assert!(matches!(
            g.evaluate(&b),
            Err(FuncError::Graph(GraphError::Cycle { .. }))
        ));
        assert!(g.evaluation_order(&a).is_err());
    }

    #[test]
    fn record_order_can_be_disabled() {
        let mut g = FunctionGraph::new();
        g.set_eval_options(fg_core::EvalOptions {
            record_order: false,
            timing: false,
        });
        let a = g.add_function(constant(3), none()).unwrap();
        g.evaluate(&a).unwrap();
        assert!(g.evaluation_order(&a).is_err());
        assert_eq!(g.cache(&a).unwrap(), &Value::from(3));
    }

    #[test]
    fn timing_fills_report() {
        let mut g = FunctionGraph::new();
        g.set_eval_options(fg_core::EvalOptions {
            record_order: true,
            timing: true,
        });
        let a = g.add_function(constant(3), none()).unwrap();
        let report = g.evaluate(&a).unwrap();
        assert!(report.timings_ms.contains_key(&a));
    }

    #[test]
    fn unevaluated_upstream_fails_fast() {
        let mut g = FunctionGraph::new();
        let a = g.add_function(constant(1), none()).unwrap();
        let b = g.add_function(add_one(), [("x", Value::from(10))]).unwrap();
        g.connect(&a, "out", &b, "x").unwrap();

        let function = g.function(&b).unwrap();
        assert_eq!(
            g.run_node(&b, &function),
            Err(ExecError::MissingUpstream {
                node: a.clone(),
                inlet: "x".into(),
            })
        );
    }

    #[test]
    fn invalidate_missing_node_fails() {
        let mut g = FunctionGraph::new();
        assert!(g.invalidate("ghost").is_err());
    }
}
