//! fg-func: function graphs and their evaluator.
//!
//! A [`FunctionGraph`] is a ported graph whose nodes carry callables
//! ([`Function`]) or nested graphs, plus stored parameter values. Evaluating a
//! node runs it and its ancestors in topological order, caching each result
//! on the node.
//!
//! # Example
//!
//! ```
//! use fg_core::Value;
//! use fg_func::{Function, FunctionGraph, Param};
//!
//! let double = Function::new("double", vec![Param::positional("x")], |args| {
//!     Ok(Value::from(args.int("x")? * 2))
//! });
//!
//! let mut graph = FunctionGraph::new();
//! let a = graph.add_function(double.clone(), [("x", Value::from(3))]).unwrap();
//! let b = graph.add_function(double, Vec::<(String, Value)>::new()).unwrap();
//! graph.connect(&a, "out", &b, "x").unwrap();
//!
//! graph.evaluate(&b).unwrap();
//! assert_eq!(graph.cache(&b).unwrap(), &Value::from(12));
//! ```

pub mod attr;
pub mod error;
pub mod eval;
pub mod function;
pub mod graph;

pub use attr::Attr;
pub use error::{ExecError, FuncError, FuncResult};
pub use eval::EvalReport;
pub use function::{CallArgs, Callable, Function, NestedGraph, NodeFunction, Param, ParamKind};
pub use graph::{FunctionGraph, InputTarget};
