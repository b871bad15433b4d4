//! `Resource` — one node in the run-graph (spec §3, §4.1).

use std::path::PathBuf;

use kestrel_core::ActionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::run_block::{RawRunBlock, RunBlock, RunBlockError};

/// Wire-format mirror of `Resource`, carrying the raw (not-yet-validated)
/// run block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResource {
    /// Canonical or local action id, per spec §3.
    pub action_id: ActionId,
    /// Source location of the resource.
    pub file: PathBuf,
    /// Upstream action ids this resource depends on.
    #[serde(default)]
    pub requires: Vec<ActionId>,
    /// Typed handler body, or `None` for a pure dependency node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RawRunBlock>,
    /// Optional iteration set; when present the node fans out (spec §4.2.3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
}

/// A node in the run-graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Canonical or local action id, per spec §3.
    pub action_id: ActionId,
    /// Source location of the resource.
    pub file: PathBuf,
    /// Upstream action ids this resource depends on.
    pub requires: Vec<ActionId>,
    /// Typed handler body, or `None` for a pure dependency node.
    pub run: Option<RunBlock>,
    /// Optional iteration set; when present the node fans out (spec §4.2.3).
    pub items: Option<Vec<Value>>,
}

impl Resource {
    /// Validate and convert a wire-format [`RawResource`].
    ///
    /// # Errors
    ///
    /// Returns [`RunBlockError`] if `run` is present but does not carry
    /// exactly one typed body.
    pub fn from_raw(raw: RawResource) -> Result<Self, RunBlockError> {
        let run = raw.run.map(RunBlock::from_raw).transpose()?;
        Ok(Self {
            action_id: raw.action_id,
            file: raw.file,
            requires: raw.requires,
            run,
            items: raw.items,
        })
    }

    /// Returns `true` if this resource has a non-empty iteration set.
    #[must_use]
    pub fn has_items(&self) -> bool {
        self.items.as_ref().is_some_and(|items| !items.is_empty())
    }

    /// Returns `true` if this is a pure dependency node (no typed body).
    #[must_use]
    pub fn is_pure_dependency(&self) -> bool {
        self.run.is_none()
    }
}
