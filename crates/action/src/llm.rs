//! LLM resource handler (spec §4.3.1).

use std::collections::HashSet;
use std::sync::Arc;

use kestrel_core::codec;
use kestrel_ports::{GenerateOptions, LlmPort, Message, Role, ToolReaderPort};
use kestrel_workflow::{ChatBlock, Tool};
use url::form_urlencoded;

use crate::context::HandlerContext;
use crate::error::ActionError;
use crate::ResourceHandler;

/// Bounded re-invocation rounds when the model keeps requesting tools, so a
/// misbehaving model can never wedge a request open forever.
const MAX_TOOL_ROUNDS: usize = 4;

fn decode_if_base64(raw: &str) -> String {
    if codec::is_base64(raw) {
        codec::decode(raw).unwrap_or_else(|_| raw.to_owned())
    } else {
        raw.to_owned()
    }
}

/// Map a workflow's raw role string to the port's coarse [`Role`] (spec
/// §4.3.1.1, exact table). Absence of a role means `Human`; an explicit
/// but unrecognized (including empty/whitespace) role means `Generic`.
#[must_use]
pub fn map_role(raw: Option<&str>) -> Role {
    let Some(raw) = raw else {
        return Role::Human;
    };
    match raw.trim().to_lowercase().as_str() {
        "human" | "user" | "person" | "client" => Role::Human,
        "system" => Role::System,
        "ai" | "assistant" | "bot" | "chatbot" | "llm" => Role::Ai,
        "function" | "action" => Role::Function,
        "tool" => Role::Tool,
        _ => Role::Generic,
    }
}

/// Build the system prompt for a chat call (spec §4.3.1.2).
#[must_use]
pub fn build_system_prompt(
    json_response: bool,
    json_response_keys: Option<&[String]>,
    tools: Option<&[Tool]>,
) -> String {
    let mut prompt = String::new();

    if json_response {
        prompt.push_str("Respond in JSON format.");
        if let Some(keys) = json_response_keys.filter(|k| !k.is_empty()) {
            let rendered = keys
                .iter()
                .map(|k| format!("`{k}`"))
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!(", include {rendered} in response keys."));
        }
    }

    match tools {
        None | Some([]) => {
            prompt.push_str(" No tools are available. Respond with the final result as a string.");
        }
        Some(tools) => {
            prompt.push_str(" You may call the following tools:\n");
            for tool in tools {
                let description = tool.description.as_deref().unwrap_or("");
                prompt.push_str(&format!("- {}: {description}", tool.name));
                let required: Vec<&str> = tool
                    .parameters
                    .iter()
                    .filter(|(_, p)| p.required)
                    .map(|(name, _)| name.as_str())
                    .collect();
                if !required.is_empty() {
                    prompt.push_str(&format!(" (requires: {})", required.join(", ")));
                }
                prompt.push('\n');
            }
        }
    }

    prompt
}

/// Build the `tool:///` invocation URI for a tool call (spec §6 wire
/// formats, §4.3.1.3).
#[must_use]
pub fn tool_uri(call_id: &str, script: &str, params: &serde_json::Value) -> String {
    let script_b64 = codec::encode_idempotent(script);
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(map) = params.as_object() {
        for (key, value) in map {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            serializer.append_pair(key, &rendered);
        }
    }
    let query = serializer.finish();
    format!("tool:///{call_id}?script={script_b64}&params={query}")
}

/// Deduplicate tool calls by `(name, arguments)` (spec §4.3.1.3), keeping
/// the first occurrence of each pair.
#[must_use]
pub fn dedupe_tool_calls(calls: Vec<kestrel_ports::ToolCall>) -> Vec<kestrel_ports::ToolCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|call| seen.insert((call.name.clone(), call.arguments.clone())))
        .collect()
}

/// The LLM resource handler.
pub struct LlmHandler {
    llm: Arc<dyn LlmPort>,
    tool_reader: Arc<dyn ToolReaderPort>,
}

impl LlmHandler {
    /// Construct a handler over the LLM client and tool-invocation ports.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmPort>, tool_reader: Arc<dyn ToolReaderPort>) -> Self {
        Self { llm, tool_reader }
    }

    async fn invoke_tool(&self, tools: &[Tool], call: &kestrel_ports::ToolCall) -> String {
        let Some(tool) = tools.iter().find(|t| t.name == call.name) else {
            return format!("error: no such tool {:?}", call.name);
        };
        let arguments: serde_json::Value = match serde_json::from_str(&call.arguments) {
            Ok(value) => value,
            Err(err) => return format!("error: invalid tool call arguments: {err}"),
        };
        if let Some(params) = arguments.as_object() {
            for param_name in tool.parameters.iter().filter(|(_, p)| p.required).map(|(n, _)| n) {
                if !params.contains_key(param_name) {
                    tracing::warn!(tool = %tool.name, missing = %param_name, "tool call missing required parameter");
                }
            }
        }
        let uri = tool_uri(&call.id, &tool.script, &arguments);
        match self.tool_reader.read(&uri).await {
            Ok(result) => result,
            Err(err) => format!("error: tool invocation failed: {err}"),
        }
    }
}

#[async_trait::async_trait]
impl ResourceHandler<ChatBlock> for LlmHandler {
    async fn handle(&self, ctx: &HandlerContext, block: &mut ChatBlock) -> Result<(), ActionError> {
        let prompt = decode_if_base64(&block.prompt);
        let client = self.llm.client(&block.model).await?;

        let mut messages = vec![Message::new(
            Role::System,
            build_system_prompt(
                block.json_response,
                block.json_response_keys.as_deref(),
                block.tools.as_deref(),
            ),
        )];

        if let Some(scenario) = &block.scenario {
            for turn in scenario {
                messages.push(Message::new(map_role(Some(turn.role.as_str())), decode_if_base64(&turn.prompt)));
            }
        }

        messages.push(Message::new(map_role(block.role.as_deref()), prompt));

        let opts = GenerateOptions {
            json_response: block.json_response,
        };

        let mut response = client.generate_content(&messages, &opts).await?;
        let mut rounds = 0;
        loop {
            let tool_calls = match response.choices.first() {
                Some(choice) => choice.tool_calls.clone(),
                None => return Err(ActionError::Protocol("model returned empty choices".into())),
            };
            if tool_calls.is_empty() || rounds >= MAX_TOOL_ROUNDS {
                break;
            }
            let tools = block.tools.clone().unwrap_or_default();
            for call in dedupe_tool_calls(tool_calls) {
                let result = self.invoke_tool(&tools, &call).await;
                messages.push(Message::new(Role::Tool, format!("[{}] {result}", call.id)));
            }
            rounds += 1;
            response = client.generate_content(&messages, &opts).await?;
        }

        let final_text = response
            .choices
            .first()
            .and_then(|choice| choice.content.clone())
            .unwrap_or_default();

        block.response = Some(final_text.clone());
        block.timestamp = Some(ctx.clock.now());

        let collection = ctx.storage_collection();
        ctx.store.set(ctx.request_id, &collection, "response", &final_text)?;
        ctx.store
            .set(ctx.request_id, &collection, "timestamp", &block.timestamp.unwrap().as_nanos().to_string())?;

        Ok(())
    }
}
