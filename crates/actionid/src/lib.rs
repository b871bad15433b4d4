//! Canonical action-id resolution (spec §4.5, C5).
//!
//! Grounded on the teacher's `ports`-port-call pattern: construct a request
//! value (here, a URI), call an injected async port, map its error into a
//! fallback rather than propagating it — resolution always produces a
//! canonical id, even when the registry is unreachable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use kestrel_core::ActionId;
use kestrel_ports::AgentRegistryPort;
use kestrel_workflow::Workflow;
use url::form_urlencoded;

/// Build the `agent:///` resolution URI for a non-canonical action id
/// against a workflow (spec §6 "Wire formats at boundary").
#[must_use]
pub fn resolution_uri(action_id: &ActionId, workflow: &Workflow) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("op", "resolve")
        .append_pair("agent", &workflow.agent_id)
        .append_pair("version", &workflow.version.to_string())
        .finish();
    format!("agent:///{}?{query}", action_id.as_str())
}

/// The canonical fallback form `@<agentID>/<actionID>:<version>` used when
/// the registry is unavailable or the lookup fails.
#[must_use]
pub fn fallback_canonical(action_id: &ActionId, workflow: &Workflow) -> ActionId {
    let canonical = format!(
        "@{}/{}:{}",
        workflow.agent_id,
        action_id.as_str(),
        workflow.version
    );
    ActionId::new(canonical).expect("constructed canonical id is never empty or whitespace")
}

/// Resolve `action_id` to its canonical `@agent/action:version` form against
/// `workflow`, consulting `registry` for non-canonical inputs.
///
/// Already-canonical ids are returned unchanged without consulting the
/// registry, which is what makes resolution idempotent (spec §8: `Resolve(Resolve(a))
/// == Resolve(a)`).
pub async fn resolve(
    action_id: &ActionId,
    workflow: &Workflow,
    registry: &Arc<dyn AgentRegistryPort>,
) -> ActionId {
    if action_id.is_canonical() {
        return action_id.clone();
    }

    let uri = resolution_uri(action_id, workflow);
    match registry.read(&uri).await {
        Ok(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) if !text.trim().is_empty() => match ActionId::new(text.trim()) {
                Ok(resolved) => resolved,
                Err(_) => fallback_canonical(action_id, workflow),
            },
            _ => fallback_canonical(action_id, workflow),
        },
        Err(err) => {
            tracing::debug!(%action_id, %err, "agent registry lookup failed, using fallback canonical id");
            fallback_canonical(action_id, workflow)
        }
    }
}
