//! `ChatBlock` — the typed body of an LLM run step (spec §3, §4.3.1).

use kestrel_core::Timestamp;
use serde::{Deserialize, Serialize};

use super::tool::Tool;

/// One scripted turn in a `ChatBlock`'s `scenario`, role-mapped at handler
/// time through the role table of spec §4.3.1.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChat {
    /// Raw role string, as authored in the manifest.
    pub role: String,
    /// Turn content.
    pub prompt: String,
}

/// The typed body of an LLM run step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBlock {
    /// Model name, passed to the LLM port to construct a client.
    pub model: String,
    /// The primary prompt for this turn.
    pub prompt: String,
    /// Raw role string for the primary prompt; absent means `"Human"` (§4.3.1.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Scripted conversation history preceding the primary prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Vec<MultiChat>>,
    /// Request JSON-mode output from the model.
    #[serde(default)]
    pub json_response: bool,
    /// Keys the response JSON is expected to include (appended to the system prompt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_response_keys: Option<Vec<String>>,
    /// Paths to files attached as binary parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Tools made available to the model for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Per-step timeout, in seconds; defaults to 60s (spec §4.2.2) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_duration: Option<u64>,
    /// Model's final textual response, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Path the response was additionally persisted to, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Watermark written by the handler on completion (spec §4.2.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl ChatBlock {
    /// Construct a minimal chat block with only the required fields set.
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            role: None,
            scenario: None,
            json_response: false,
            json_response_keys: None,
            files: None,
            tools: None,
            timeout_duration: None,
            response: None,
            file: None,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_optional_fields() {
        let block = ChatBlock::new("gpt", "hello");
        assert!(block.role.is_none());
        assert!(block.tools.is_none());
        assert!(!block.json_response);
    }

    #[test]
    fn serde_roundtrip_minimal() {
        let block = ChatBlock::new("gpt", "hello");
        let json = serde_json::to_string(&block).unwrap();
        let back: ChatBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn serde_roundtrip_with_scenario_and_tools() {
        let mut block = ChatBlock::new("gpt", "hello");
        block.scenario = Some(vec![MultiChat {
            role: "system".into(),
            prompt: "be terse".into(),
        }]);
        block.json_response = true;
        block.json_response_keys = Some(vec!["summary".into()]);
        let json = serde_json::to_string(&block).unwrap();
        let back: ChatBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }
}
