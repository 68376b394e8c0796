//! Callables bound to graph nodes.
//!
//! A [`Function`] pairs a Rust closure with an explicit list of parameter
//! descriptors. The descriptors are fixed when the function is built and drive
//! both port enumeration and argument binding at evaluation time.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use fg_core::Value;
use indexmap::IndexMap;

use crate::error::ExecError;
use crate::graph::FunctionGraph;

/// How an argument is passed to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Passed positionally while every earlier positional parameter is bound,
    /// by keyword after the first gap.
    Positional,
    /// Always passed by keyword.
    Keyword,
    /// Catch-all receiving bound names that match no declared parameter.
    Variadic,
}

/// Parameter descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// The callable supplies its own value when the parameter is unbound.
    pub has_default: bool,
}

impl Param {
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Positional,
            has_default: false,
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Keyword,
            has_default: false,
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Variadic,
            has_default: true,
        }
    }

    /// Mark the parameter as optional.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn is_variadic(&self) -> bool {
        self.kind == ParamKind::Variadic
    }
}

/// Arguments handed to a callable, split into positional and keyword.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    positional_names: Vec<String>,
    keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_positional(&mut self, name: impl Into<String>, value: Value) {
        self.positional_names.push(name.into());
        self.positional.push(value);
    }

    pub fn insert_keyword(&mut self, name: impl Into<String>, value: Value) {
        self.keyword.insert(name.into(), value);
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Argument bound to `name`, however it was passed.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.positional_names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.positional[i])
            .or_else(|| self.keyword.get(name))
    }

    pub fn require(&self, name: &str) -> Result<&Value, ExecError> {
        self.get(name)
            .ok_or_else(|| ExecError::MissingArgument(name.to_string()))
    }

    pub fn str(&self, name: &str) -> Result<&str, ExecError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "str", value))
    }

    pub fn int(&self, name: &str) -> Result<i64, ExecError> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| mismatch(name, "int", value))
    }

    pub fn float(&self, name: &str) -> Result<f64, ExecError> {
        let value = self.require(name)?;
        value.as_float().ok_or_else(|| mismatch(name, "float", value))
    }
}

fn mismatch(name: &str, expected: &'static str, found: &Value) -> ExecError {
    ExecError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Signature of the closure behind a [`Function`].
pub type Callable = dyn Fn(&CallArgs) -> Result<Value, ExecError>;

/// A named callable with declared parameters.
///
/// Cloning is cheap and clones share the closure, so the same function can be
/// bound into several nodes.
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    params: Rc<[Param]>,
    call: Rc<Callable>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, params: Vec<Param>, call: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, ExecError> + 'static,
    {
        Self {
            name: Some(name.into()),
            params: params.into(),
            call: Rc::new(call),
        }
    }

    /// A function without a display name; nodes built from it are named `function{n}`.
    pub fn anonymous<F>(params: Vec<Param>, call: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, ExecError> + 'static,
    {
        Self {
            name: None,
            params: params.into(),
            call: Rc::new(call),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Every parameter name in declaration order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    /// Parameter names usable as inlets (variadic catch-alls excluded).
    pub fn inlet_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.is_variadic())
            .map(|p| p.name.clone())
            .collect()
    }

    fn variadic(&self) -> bool {
        self.params.iter().any(Param::is_variadic)
    }

    /// Arrange named bindings into call arguments according to the
    /// parameter descriptors.
    pub fn bind(&self, mut bound: IndexMap<String, Value>) -> Result<CallArgs, ExecError> {
        let mut args = CallArgs::new();
        let mut gap = false;

        for param in self.params.iter().filter(|p| !p.is_variadic()) {
            match bound.shift_remove(&param.name) {
                Some(value) if param.kind == ParamKind::Positional && !gap => {
                    args.push_positional(param.name.clone(), value);
                }
                Some(value) => args.insert_keyword(param.name.clone(), value),
                None if param.has_default => gap |= param.kind == ParamKind::Positional,
                None => return Err(ExecError::MissingArgument(param.name.clone())),
            }
        }

        if let Some((name, _)) = bound.first() {
            if !self.variadic() {
                return Err(ExecError::UnexpectedArgument(name.clone()));
            }
        }
        for (name, value) in bound {
            args.insert_keyword(name, value);
        }
        Ok(args)
    }

    pub fn call(&self, args: &CallArgs) -> Result<Value, ExecError> {
        (self.call)(args)
    }

    /// Whether both handles share the same closure.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a graph used as a node's function.
pub type NestedGraph = Rc<RefCell<FunctionGraph>>;

/// What a node's `_fn` attribute holds.
#[derive(Clone)]
pub enum NodeFunction {
    Plain(Function),
    Nested(NestedGraph),
}

impl NodeFunction {
    /// Base name used when generating node ids.
    pub fn display_name(&self) -> String {
        match self {
            NodeFunction::Plain(f) => f.name().unwrap_or("function").to_string(),
            NodeFunction::Nested(graph) => graph
                .try_borrow()
                .ok()
                .and_then(|g| g.name().map(str::to_string))
                .unwrap_or_else(|| "graph".to_string()),
        }
    }
}

impl PartialEq for NodeFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeFunction::Plain(a), NodeFunction::Plain(b)) => a.ptr_eq(b),
            (NodeFunction::Nested(a), NodeFunction::Nested(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for NodeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFunction::Plain(func) => f.debug_tuple("Plain").field(func).finish(),
            NodeFunction::Nested(_) => f
                .debug_tuple("Nested")
                .field(&self.display_name())
                .finish(),
        }
    }
}

impl From<Function> for NodeFunction {
    fn from(f: Function) -> Self {
        NodeFunction::Plain(f)
    }
}

impl From<NestedGraph> for NodeFunction {
    fn from(graph: NestedGraph) -> Self {
        NodeFunction::Nested(graph)
    }
}
