//! The demo pipeline: read a text file, then upper-case it.

use std::path::Path;

use fg_core::{FlowConfig, NodeId, Value};
use fg_func::{Function, FunctionGraph, Param};

use crate::error::CliResult;

/// Ids of the two pipeline nodes.
pub struct Pipeline {
    pub graph: FunctionGraph,
    pub read: NodeId,
    pub upper: NodeId,
}

impl Pipeline {
    /// Text produced by the read node, if it has run successfully.
    pub fn raw_text(&self) -> Option<&Value> {
        self.graph.cache(&self.read).ok()
    }
}

fn read() -> Function {
    Function::new("read", vec![Param::positional("path")], |args| {
        Ok(Value::from(std::fs::read_to_string(args.str("path")?)?))
    })
}

fn upper() -> Function {
    Function::new("upper", vec![Param::positional("text")], |args| {
        Ok(Value::from(args.str("text")?.to_uppercase()))
    })
}

/// Build `read1 -> upper1` with `path` stored on the read node.
pub fn build(path: &Path, config: &FlowConfig) -> CliResult<Pipeline> {
    let mut graph = FunctionGraph::with_config(config);
    graph.set_name("upper-case");

    let read = graph.add_function(read(), [("path", Value::from(path.to_string_lossy().into_owned()))])?;
    let upper = graph.add_function(upper(), Vec::<(String, Value)>::new())?;
    graph.connect(&read, "out", &upper, "text")?;

    Ok(Pipeline { graph, read, upper })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_upper_cases_file() {
        let path = std::env::temp_dir().join(format!("fg-cli-pipeline-{}.txt", std::process::id()));
        std::fs::write(&path, "abc").unwrap();

        let mut pipeline = build(&path, &FlowConfig::default()).unwrap();
        assert_eq!(pipeline.read.as_str(), "read1");
        assert_eq!(pipeline.upper.as_str(), "upper1");
        assert!(pipeline.raw_text().is_none());

        let report = pipeline.graph.evaluate(&pipeline.upper).unwrap();
        assert!(report.succeeded());
        assert_eq!(pipeline.graph.cache(&pipeline.upper).unwrap(), &Value::from("ABC"));
        assert_eq!(pipeline.raw_text(), Some(&Value::from("abc")));
        assert!(pipeline.graph.validate_ports().is_empty());

        std::fs::remove_file(&path).unwrap();
    }
}
