//! LLM client port (spec §6 "LLM client port", §4.3.1).
//!
//! The engine never talks to a concrete model provider; it asks [`LlmPort`]
//! for a client keyed by model name and drives it through [`LlmClient`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::PortsError;

/// Coarse message role, already mapped from the workflow's raw role string
/// (see the LLM handler's role table) to the shape a model API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// End-user turn.
    Human,
    /// System/instruction turn.
    System,
    /// Model turn.
    Ai,
    /// Function/action result turn.
    Function,
    /// Tool result turn.
    Tool,
    /// Unrecognized or empty role.
    Generic,
}

/// One turn in a chat-style conversation sent to [`LlmClient::generate_content`].
#[derive(Debug, Clone)]
pub struct Message {
    /// Who is speaking this turn.
    pub role: Role,
    /// Text content of the turn.
    pub content: String,
}

impl Message {
    /// Construct a message with the given role and content.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the model.
///
/// `arguments` is carried as the raw JSON text the model returned; the
/// caller is responsible for parsing it (spec §4.3.1.3 treats a parse
/// failure as a per-call `invalid tool call`, not a transport error).
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Identifier the model assigned to this call, used to key the result.
    pub id: String,
    /// Name of the tool the model wants invoked.
    pub name: String,
    /// Raw JSON text of the call arguments.
    pub arguments: String,
}

/// Options controlling a single `generate_content` call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Request JSON-mode output from the model, when supported.
    pub json_response: bool,
}

/// One candidate answer from the model.
#[derive(Debug, Clone, Default)]
pub struct Choice {
    /// Text content of the choice, if the model produced one.
    pub content: Option<String>,
    /// Tool calls requested by the model in this choice.
    pub tool_calls: Vec<ToolCall>,
}

/// Response envelope from [`LlmClient::generate_content`].
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Candidate choices returned by the model; spec §4.3.1 treats an empty
    /// list as a runtime-domain error (model returned empty choices).
    pub choices: Vec<Choice>,
}

/// A model client bound to one model name.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a full message sequence and get back choices / tool calls.
    async fn generate_content(
        &self,
        messages: &[Message],
        opts: &GenerateOptions,
    ) -> Result<GenerateResponse, PortsError>;

    /// Send a single prompt and get back its text completion.
    async fn call(&self, prompt: &str) -> Result<String, PortsError>;
}

/// Port for constructing model clients by name.
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Construct (or look up) a client for the given model name.
    async fn client(&self, model: &str) -> Result<Arc<dyn LlmClient>, PortsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructor() {
        let msg = Message::new(Role::System, "be terse");
        assert_eq!(msg.content, "be terse");
        assert!(matches!(msg.role, Role::System));
    }

    #[test]
    fn generate_options_default_is_not_json() {
        let opts = GenerateOptions::default();
        assert!(!opts.json_response);
    }

    #[test]
    fn choice_default_has_no_tool_calls() {
        let choice = Choice::default();
        assert!(choice.content.is_none());
        assert!(choice.tool_calls.is_empty());
    }

    #[test]
    fn trait_objects_are_object_safe() {
        fn _assert_client(_: &dyn LlmClient) {}
        fn _assert_port(_: &dyn LlmPort) {}
    }
}
