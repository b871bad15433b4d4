//! Tool declarations attached to an LLM [`ChatBlock`](super::chat::ChatBlock) (spec §3 "Tool").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A parameter declared on a [`Tool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Whether the model must supply this parameter.
    pub required: bool,
    /// Parameter type hint (e.g. `"string"`, `"number"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description shown in the system prompt rubric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A tool a workflow resource makes available to an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, matched against a model's tool-call name.
    pub name: String,
    /// Script invoked when the tool is called.
    pub script: String,
    /// Description shown in the system prompt rubric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters the tool accepts, keyed by name.
    #[serde(default)]
    pub parameters: HashMap<String, ToolParameter>,
}
