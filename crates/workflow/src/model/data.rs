//! `DataBlock` — the typed body of a data-file registration step (spec §3, §4.3.4).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The typed body of a data-registration run step.
///
/// Populated by enumerating the data directory (an external collaborator,
/// spec §1); this type only carries the resulting map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataBlock {
    /// `agentVersion -> (filename -> base64-encoded contents)`.
    #[serde(default)]
    pub files: HashMap<String, HashMap<String, String>>,
}

impl DataBlock {
    /// An empty data block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
