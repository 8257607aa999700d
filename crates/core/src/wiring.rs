//! Execution wirings: which adapter feeds which workflow input, and where
//! each workflow output goes.
//!
//! Adapter semantics are the execution engine's concern; this crate only
//! carries the bindings.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Binding of one workflow input to a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputWiring {
    pub workflow_input_name: String,
    #[serde(default = "default_adapter")]
    pub adapter_id: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub ref_id_type: Option<String>,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub use_default_value: bool,
}

/// Binding of one workflow output to a sink adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputWiring {
    pub workflow_output_name: String,
    #[serde(default = "default_adapter")]
    pub adapter_id: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub ref_id_type: Option<String>,
    #[serde(default, rename = "type")]
    pub sink_type: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, JsonValue>,
}

fn default_adapter() -> String {
    "direct_provisioning".to_string()
}

/// Complete wiring for one execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowWiring {
    #[serde(default)]
    pub input_wirings: Vec<InputWiring>,
    #[serde(default)]
    pub output_wirings: Vec<OutputWiring>,
}

impl WorkflowWiring {
    pub fn is_empty(&self) -> bool {
        self.input_wirings.is_empty() && self.output_wirings.is_empty()
    }

    /// Look up the wiring of a named workflow input.
    pub fn input(&self, name: &str) -> Option<&InputWiring> {
        self.input_wirings
            .iter()
            .find(|w| w.workflow_input_name == name)
    }
}
