//! Graph and evaluation options.
//!
//! Options are plain serde structs so embedding applications can keep them in
//! their own YAML settings. Every field has a default, so an empty document is
//! a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::timing;

/// Structural policy of a graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Create missing endpoint nodes when an edge is added.
    ///
    /// Off by default: adding an edge to an unknown node is an error.
    pub auto_create_nodes: bool,
}

/// Evaluator behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Write the `evaluation_order` attribute on every node of a pass.
    pub record_order: bool,
    /// Measure wall-clock time of each node invocation.
    pub timing: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            record_order: true,
            timing: false,
        }
    }
}

impl EvalOptions {
    /// Whether node timing is on, either here or through `FG_TIMING`.
    pub fn timing_enabled(&self) -> bool {
        self.timing || timing::is_enabled()
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub graph: GraphOptions,
    pub eval: EvalOptions,
}

impl FlowConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(FlowConfig::from_yaml_str("").unwrap(), FlowConfig::default());
        assert_eq!(FlowConfig::from_yaml_str("{}").unwrap(), FlowConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = FlowConfig::from_yaml_str("graph:\n  auto_create_nodes: true\n").unwrap();
        assert!(config.graph.auto_create_nodes);
        assert!(config.eval.record_order);
        assert!(!config.eval.timing);
    }

    #[test]
    fn yaml_round_trip() {
        let config = FlowConfig {
            graph: GraphOptions {
                auto_create_nodes: true,
            },
            eval: EvalOptions {
                record_order: false,
                timing: true,
            },
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(FlowConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FlowConfig::load(Path::new("/nonexistent/flowgraph.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigRead { .. }));
        assert!(err.to_string().contains("/nonexistent/flowgraph.yaml"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = FlowConfig::from_yaml_str("graph: [1, 2").unwrap_err();
        assert!(matches!(err, CoreError::Yaml(_)));
    }
}
