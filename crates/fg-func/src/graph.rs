//! Graph of callables wired port to port.

use std::cell::RefCell;
use std::rc::Rc;

use fg_core::{EdgeId, EdgeKey, EvalOptions, FlowConfig, GraphOptions, NodeId, Value};
use fg_graph::{AttributedMultigraph, EventKind, GraphEvent, PortKind, PortMismatch, PortedGraph, SubscriptionId};
use indexmap::{IndexMap, IndexSet};

use crate::attr::{self, Attr};
use crate::error::{ExecError, FuncError, FuncResult};
use crate::function::{NestedGraph, NodeFunction};

/// Internal address an external input is forwarded to: `(node, inlet)`.
pub type InputTarget = (NodeId, String);

/// A ported graph whose nodes carry callables and parameter values.
///
/// Node attributes hold the bound function (`_fn`), stored parameter values,
/// and the evaluation artifacts (`cache`, `error`, `evaluation_order`).
/// A `FunctionGraph` can itself be bound to a node of an enclosing graph, in
/// which case [`set_inputs`](Self::set_inputs) and
/// [`set_output`](Self::set_output) define its ports.
#[derive(Debug, Default)]
pub struct FunctionGraph {
    name: Option<String>,
    pub(crate) graph: PortedGraph<Attr>,
    pub(crate) options: EvalOptions,
    inputs: IndexMap<String, InputTarget>,
    output: Option<NodeId>,
}

impl FunctionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_config(config: &FlowConfig) -> Self {
        Self {
            graph: PortedGraph::with_options(config.graph),
            options: config.eval,
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn graph_options(&self) -> GraphOptions {
        self.graph.base().options()
    }

    pub fn eval_options(&self) -> EvalOptions {
        self.options
    }

    pub fn set_eval_options(&mut self, options: EvalOptions) {
        self.options = options;
    }

    /// Wrap the graph in a shared handle for binding into another graph.
    pub fn into_shared(self) -> NestedGraph {
        Rc::new(RefCell::new(self))
    }

    /// The underlying ported graph.
    pub fn base(&self) -> &PortedGraph<Attr> {
        &self.graph
    }

    /// The underlying ported graph, mutable.
    ///
    /// Writes through this handle are not checked against reserved names.
    pub fn base_mut(&mut self) -> &mut PortedGraph<Attr> {
        &mut self.graph
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Add a node running `function`, with initial parameter values.
    ///
    /// The id is `{name}{n}` for the smallest `n >= 1` not already in use.
    pub fn add_function<I, K>(&mut self, function: impl Into<NodeFunction>, params: I) -> FuncResult<NodeId>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let function = function.into();
        let id = self.unique_id(&function.display_name());
        self.insert_function(id.clone(), function, params)?;
        Ok(id)
    }

    /// Add a node running a nested graph.
    pub fn add_subgraph<I, K>(&mut self, graph: NestedGraph, params: I) -> FuncResult<NodeId>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_function(NodeFunction::Nested(graph), params)
    }

    /// Add a node with a caller-chosen id running `function`.
    pub fn insert_function<I, K>(
        &mut self,
        id: impl Into<NodeId>,
        function: impl Into<NodeFunction>,
        params: I,
    ) -> FuncResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut attrs: Vec<(String, Attr)> = vec![(attr::FN.to_string(), Attr::Function(function.into()))];
        for (name, value) in params {
            let name = name.into();
            if attr::is_reserved(&name) {
                return Err(FuncError::ReservedAttribute(name));
            }
            attrs.push((name, Attr::Value(value)));
        }
        self.graph.add_node_with(id, attrs)?;
        Ok(())
    }

    /// First free id of the form `{base}{n}`, `n >= 1`.
    pub fn unique_id(&self, base: &str) -> NodeId {
        (1u64..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !self.graph.contains_node(candidate))
            .map(NodeId::from)
            .unwrap_or_else(|| NodeId::from(base))
    }

    /// The function bound to `id`.
    pub fn function(&self, id: &str) -> FuncResult<NodeFunction> {
        let attrs = self.graph.base().attributes(id)?;
        match attrs.get(attr::FN) {
            Some(Attr::Function(f)) => Ok(f.clone()),
            Some(_) => Err(FuncError::NotCallable(id.into())),
            None => Err(FuncError::NoFunction(id.into())),
        }
    }

    /// Declared parameter names of the node's function, in order.
    ///
    /// For a nested graph these are its external input names.
    pub fn parameters(&self, id: &str) -> FuncResult<Vec<String>> {
        match self.function(id)? {
            NodeFunction::Plain(f) => Ok(f.parameter_names()),
            NodeFunction::Nested(graph) => self.nested_inputs(id, &graph),
        }
    }

    fn nested_inputs(&self, id: &str, graph: &NestedGraph) -> FuncResult<Vec<String>> {
        let graph = graph
            .try_borrow()
            .map_err(|_| FuncError::SubgraphBusy(id.into()))?;
        Ok(graph.inputs.keys().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub fn parameter_value(&self, id: &str, name: &str) -> FuncResult<&Value> {
        check_name(name)?;
        self.value_attribute(id, name)
    }

    pub fn set_parameter_value(&mut self, id: &str, name: &str, value: impl Into<Value>) -> FuncResult<()> {
        check_name(name)?;
        self.graph
            .update_attributes(id, [(name, Attr::Value(value.into()))])?;
        Ok(())
    }

    pub fn delete_parameter_value(&mut self, id: &str, name: &str) -> FuncResult<Value> {
        check_name(name)?;
        self.value_attribute(id, name)?;
        match self.graph.delete_attribute(id, name)? {
            Attr::Value(value) => Ok(value),
            _ => Err(FuncError::NotAValue {
                node: id.into(),
                name: name.to_string(),
            }),
        }
    }

    fn value_attribute(&self, id: &str, name: &str) -> FuncResult<&Value> {
        self.graph
            .attribute(id, name)?
            .as_value()
            .ok_or_else(|| FuncError::NotAValue {
                node: id.into(),
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Ports
    // ------------------------------------------------------------------

    /// Inlet names: the function's non-variadic parameters, a nested graph's
    /// inputs, or the explicit `inlets` attribute of a node without function.
    pub fn inlets(&self, id: &str) -> FuncResult<Vec<String>> {
        match self.function(id) {
            Ok(NodeFunction::Plain(f)) => Ok(f.inlet_names()),
            Ok(NodeFunction::Nested(graph)) => self.nested_inputs(id, &graph),
            Err(FuncError::NoFunction(_)) => Ok(self.graph.inlets(id)?),
            Err(err) => Err(err),
        }
    }

    /// Outlet names: `["out"]` for a node with a function, otherwise the
    /// explicit `outlets` attribute.
    pub fn outlets(&self, id: &str) -> FuncResult<Vec<String>> {
        match self.function(id) {
            Ok(_) => Ok(vec!["out".to_string()]),
            Err(FuncError::NoFunction(_)) => Ok(self.graph.outlets(id)?),
            Err(err) => Err(err),
        }
    }

    /// Edges naming a port their endpoint does not have.
    pub fn validate_ports(&self) -> Vec<PortMismatch> {
        self.graph.port_mismatches(|node, kind| {
            let ports = match kind {
                PortKind::Inlet => self.inlets(node),
                PortKind::Outlet => self.outlets(node),
            };
            ports.unwrap_or_default()
        })
    }

    // ------------------------------------------------------------------
    // Nested graph interface
    // ------------------------------------------------------------------

    /// Declare the external inputs of this graph, replacing any previous ones.
    ///
    /// Each entry maps an external name to the `(node, inlet)` it feeds.
    pub fn set_inputs<I, K, N, S>(&mut self, inputs: I) -> FuncResult<()>
    where
        I: IntoIterator<Item = (K, (N, S))>,
        K: Into<String>,
        N: Into<NodeId>,
        S: Into<String>,
    {
        let mut resolved = IndexMap::new();
        for (name, (node, inlet)) in inputs {
            let node = node.into();
            if !self.graph.contains_node(&node) {
                return Err(fg_graph::GraphError::NodeNotFound(node).into());
            }
            let inlet = inlet.into();
            check_name(&inlet)?;
            resolved.insert(name.into(), (node, inlet));
        }
        self.inputs = resolved;
        Ok(())
    }

    pub fn inputs(&self) -> &IndexMap<String, InputTarget> {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> FuncResult<&InputTarget> {
        self.inputs
            .get(name)
            .ok_or_else(|| FuncError::UnknownInput(name.to_string()))
    }

    /// Designate the node whose result is this graph's output.
    pub fn set_output(&mut self, id: &str) -> FuncResult<()> {
        if !self.graph.contains_node(id) {
            return Err(fg_graph::GraphError::NodeNotFound(id.into()).into());
        }
        self.output = Some(id.into());
        Ok(())
    }

    pub fn output(&self) -> Option<&NodeId> {
        self.output.as_ref()
    }

    // ------------------------------------------------------------------
    // Evaluation artifacts
    // ------------------------------------------------------------------

    /// Result of the node's last successful invocation.
    pub fn cache(&self, id: &str) -> FuncResult<&Value> {
        match self.graph.base().attributes(id)?.get(attr::CACHE) {
            Some(Attr::Value(value)) => Ok(value),
            Some(_) => Err(FuncError::NotAValue {
                node: id.into(),
                name: attr::CACHE.to_string(),
            }),
            None => Err(FuncError::NotEvaluated {
                node: id.into(),
                what: attr::CACHE,
            }),
        }
    }

    /// Failure of the node's last invocation.
    pub fn error(&self, id: &str) -> FuncResult<&ExecError> {
        match self.graph.base().attributes(id)?.get(attr::ERROR) {
            Some(Attr::Error(err)) => Ok(err),
            _ => Err(FuncError::NotEvaluated {
                node: id.into(),
                what: attr::ERROR,
            }),
        }
    }

    /// Position of the node in the most recent pass that reached it.
    pub fn evaluation_order(&self, id: &str) -> FuncResult<usize> {
        match self.graph.base().attributes(id)?.get(attr::EVALUATION_ORDER) {
            Some(Attr::Value(Value::Int(position))) => {
                usize::try_from(*position).map_err(|_| FuncError::NotAValue {
                    node: id.into(),
                    name: attr::EVALUATION_ORDER.to_string(),
                })
            }
            _ => Err(FuncError::NotEvaluated {
                node: id.into(),
                what: attr::EVALUATION_ORDER,
            }),
        }
    }

    /// Store the outcome of an invocation. `cache` and `error` never coexist.
    pub(crate) fn record(&mut self, id: &str, outcome: Result<Value, ExecError>) -> FuncResult<()> {
        match outcome {
            Ok(value) => {
                self.graph.base_mut().discard_attribute(id, attr::ERROR)?;
                self.graph.update_attributes(id, [(attr::CACHE, Attr::Value(value))])?;
            }
            Err(err) => {
                self.graph.base_mut().discard_attribute(id, attr::CACHE)?;
                self.graph.update_attributes(id, [(attr::ERROR, Attr::Error(err))])?;
            }
        }
        Ok(())
    }

    /// Drop `cache` and `error` if present.
    pub(crate) fn clear_results(&mut self, id: &str) -> FuncResult<()> {
        let graph = self.graph.base_mut();
        graph.discard_attribute(id, attr::CACHE)?;
        graph.discard_attribute(id, attr::ERROR)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delegation to the ported graph
    // ------------------------------------------------------------------

    /// Add a node without a function.
    pub fn add_node(&mut self, id: impl Into<NodeId>) -> FuncResult<()> {
        Ok(self.graph.add_node(id)?)
    }

    /// Remove a node and its edges, dropping it from the input map and output.
    pub fn remove_node(&mut self, id: &str) -> FuncResult<()> {
        self.graph.remove_node(id)?;
        self.inputs.retain(|_, (node, _)| node.as_str() != id);
        if self.output.as_deref() == Some(id) {
            self.output = None;
        }
        Ok(())
    }

    pub fn add_edge(&mut self, source: &str, target: &str, key: EdgeKey) -> FuncResult<EdgeId> {
        Ok(self.graph.add_edge(source, target, key)?)
    }

    /// Connect `source.outlet` to `target.inlet`.
    pub fn connect(&mut self, source: &str, outlet: &str, target: &str, inlet: &str) -> FuncResult<EdgeId> {
        Ok(self.graph.connect(source, outlet, target, inlet)?)
    }

    pub fn remove_edge(&mut self, edge: &EdgeId) -> FuncResult<()> {
        self.graph.remove_edge(edge)?;
        Ok(())
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.graph.contains_node(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.base().node_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.graph.edges()
    }

    pub fn in_edges<'a>(
        &'a self,
        id: &str,
        inlet: Option<&'a str>,
    ) -> impl Iterator<Item = &'a EdgeId> + use<'a> {
        self.graph.in_edges(id, inlet)
    }

    pub fn out_edges<'a>(
        &'a self,
        id: &str,
        outlet: Option<&'a str>,
    ) -> impl Iterator<Item = &'a EdgeId> + use<'a> {
        self.graph.out_edges(id, outlet)
    }

    pub fn ancestors(&self, id: &str) -> FuncResult<IndexSet<NodeId>> {
        Ok(self.graph.base().ancestors(id)?)
    }

    pub fn descendants(&self, id: &str) -> FuncResult<IndexSet<NodeId>> {
        Ok(self.graph.base().descendants(id)?)
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<Attr>) + 'static,
    {
        self.graph.subscribe(kind, callback)
    }

    pub fn subscribe_all<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &AttributedMultigraph<Attr>) + 'static,
    {
        self.graph.subscribe_all(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.graph.unsubscribe(id)
    }
}

fn check_name(name: &str) -> FuncResult<()> {
    if attr::is_reserved(name) {
        Err(FuncError::ReservedAttribute(name.to_string()))
    } else {
        Ok(())
    }
}
