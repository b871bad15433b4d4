//! `Workflow` — the immutable per-request document (spec §3).

use kestrel_core::ActionId;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings carried on the [`Workflow`] document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Whether errors assemble a JSON response (true) or surface as a plain
    /// control-flow error (false), per spec §7 "User-visible failure behaviour".
    #[serde(default)]
    pub api_server_mode: bool,
    /// Free-form per-agent settings, opaque to the core.
    #[serde(default)]
    pub agent_settings: Value,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            api_server_mode: false,
            agent_settings: Value::Null,
        }
    }
}

/// The workflow document: immutable for the lifetime of one request (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Owning agent's name.
    #[serde(rename = "agentID")]
    pub agent_id: String,
    /// Workflow semver.
    pub version: Version,
    /// Action id the request asked to resolve.
    #[serde(rename = "targetActionID")]
    pub target_action_id: ActionId,
    /// Request-scoped settings.
    #[serde(default)]
    pub settings: WorkflowSettings,
}

impl Workflow {
    /// Construct a workflow document with default settings.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, version: Version, target_action_id: ActionId) -> Self {
        Self {
            agent_id: agent_id.into(),
            version,
            target_action_id,
            settings: WorkflowSettings::default(),
        }
    }
}
