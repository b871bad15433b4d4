//! The resolver engine's error taxonomy (spec §7).
//!
//! Five kinds, not five Rust types: Transport, Validation, Runtime-domain,
//! Protocol and Assembly errors all flow through [`ResolverError`] so every
//! crate in the workspace propagates errors the same way, grounded on the
//! teacher's `nebula-execution::ExecutionError` / `nebula-ports::PortsError`
//! shape (a flat `thiserror` enum with convenience constructors, no nested
//! error hierarchies per kind).

use std::time::Duration;

use kestrel_core::ActionId;
use serde::{Deserialize, Serialize};

/// An error produced anywhere in the resolver engine.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// A handler's `(step)` invocation failed; wrapped per spec §4.2.2 step 3
    /// as `"<step> error: <cause>"`. Transport and protocol failures both
    /// surface this way once a handler has given up.
    #[error("{step} error: {cause}")]
    Step {
        /// The step that failed (`exec`, `python`, `llm`, `http`, `data`).
        step: &'static str,
        /// The underlying cause, as text.
        cause: String,
    },

    /// A manifest invariant was violated: missing required field, malformed
    /// block, or a non-canonical action id used where one must be canonical.
    #[error("validation: {0}")]
    Validation(String),

    /// The dependency graph contains a cycle. Fatal at construction time
    /// (spec §4.1, §8 scenario 6); carries the offending chain.
    #[error("cycle detected: {}", render_chain(.0))]
    CycleDetected(Vec<ActionId>),

    /// `WaitForTimestampChange` did not observe a change before `waited`
    /// elapsed (spec §4.2.2 step 4).
    #[error("timeout waiting for {step} on {resource} after {waited:?}")]
    Timeout {
        /// The resource whose step did not complete in time.
        resource: ActionId,
        /// Which step timed out.
        step: &'static str,
        /// How long the scheduler waited before giving up.
        waited: Duration,
    },

    /// A pklres write used a non-canonical collection key (spec §3 invariant 1,
    /// §4.4).
    #[error("non-canonical action id used as pklres collection: {0}")]
    NotCanonical(ActionId),

    /// Response-assembly failure: a target-file conflict, or a missing
    /// `apiResponse` block where the workflow declared one (spec §7, kind
    /// "Assembly").
    #[error("assembly error: {0}")]
    Assembly(String),

    /// The request's cancellation token fired.
    #[error("cancelled")]
    Cancelled,
}

fn render_chain(chain: &[ActionId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ResolverError {
    /// Wrap a handler failure as a step error, per spec §4.2.2 step 3.
    #[must_use]
    pub fn step(step: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Step {
            step,
            cause: cause.to_string(),
        }
    }

    /// Returns `true` for error kinds that are fatal by default (Validation,
    /// CycleDetected, Assembly, Cancelled) as opposed to kinds the scheduler
    /// treats as non-fatal unless a resource opts in otherwise (spec §7).
    #[must_use]
    pub fn is_fatal_by_default(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::CycleDetected(_) | Self::Assembly(_) | Self::Cancelled
        )
    }

    /// A stable numeric code for this error, used when it is recorded in the
    /// error registry and surfaced in the response JSON (spec §6 wire format).
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Step { .. } => 502,
            Self::Validation(_) => 400,
            Self::CycleDetected(_) => 400,
            Self::Timeout { .. } => 504,
            Self::NotCanonical(_) => 400,
            Self::Assembly(_) => 500,
            Self::Cancelled => 499,
        }
    }
}

/// A single error entry as recorded in the error registry and echoed in the
/// response JSON's `errors` array (spec §6 wire format, exact shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// The action id this error is attributed to, if any.
    #[serde(skip_serializing_if = "Option::is_none", rename = "actionId")]
    pub action_id: Option<String>,
}

impl ApiError {
    /// Construct an [`ApiError`] attributed to a specific action.
    #[must_use]
    pub fn for_action(action_id: &ActionId, code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            action_id: Some(action_id.to_string()),
        }
    }

    /// Construct an [`ApiError`] with no action-id attribution.
    #[must_use]
    pub fn unattributed(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            action_id: None,
        }
    }

    /// Build an [`ApiError`] from a [`ResolverError`], attributing it to
    /// `action_id` when one is relevant.
    #[must_use]
    pub fn from_resolver_error(err: &ResolverError, action_id: Option<&ActionId>) -> Self {
        match action_id {
            Some(id) => Self::for_action(id, err.code(), err.to_string()),
            None => Self::unattributed(err.code(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_formats_per_spec() {
        let err = ResolverError::step("exec", "command not found");
        assert_eq!(err.to_string(), "exec error: command not found");
    }

    #[test]
    fn cycle_detected_renders_chain() {
        let chain = vec![
            ActionId::new("a").unwrap(),
            ActionId::new("b").unwrap(),
            ActionId::new("a").unwrap(),
        ];
        let err = ResolverError::CycleDetected(chain);
        assert_eq!(err.to_string(), "cycle detected: a -> b -> a");
    }

    #[test]
    fn timeout_error_formats() {
        let err = ResolverError::Timeout {
            resource: ActionId::new("@ag/a:1").unwrap(),
            step: "http",
            waited: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("timeout waiting for http"));
    }

    #[test]
    fn fatal_by_default_kinds() {
        assert!(ResolverError::Validation("x".into()).is_fatal_by_default());
        assert!(ResolverError::CycleDetected(vec![]).is_fatal_by_default());
        assert!(ResolverError::Assembly("x".into()).is_fatal_by_default());
        assert!(ResolverError::Cancelled.is_fatal_by_default());
    }

    #[test]
    fn non_fatal_by_default_kinds() {
        assert!(!ResolverError::step("http", "x").is_fatal_by_default());
        assert!(!ResolverError::Timeout {
            resource: ActionId::new("a").unwrap(),
            step: "llm",
            waited: Duration::from_secs(1),
        }
        .is_fatal_by_default());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ResolverError::Validation("x".into()).code(), 400);
        assert_eq!(ResolverError::Assembly("x".into()).code(), 500);
        assert_eq!(ResolverError::Cancelled.code(), 499);
    }

    #[test]
    fn api_error_for_action() {
        let id = ActionId::new("@ag/post:1").unwrap();
        let err = ApiError::for_action(&id, 400, "requires request body");
        assert_eq!(err.code, 400);
        assert_eq!(err.action_id.as_deref(), Some("@ag/post:1"));
    }

    #[test]
    fn api_error_serializes_without_action_id_when_absent() {
        let err = ApiError::unattributed(500, "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("actionId").is_none());
    }

    #[test]
    fn api_error_serializes_action_id_as_camel_case() {
        let id = ActionId::new("@ag/post:1").unwrap();
        let err = ApiError::for_action(&id, 400, "bad");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["actionId"], "@ag/post:1");
    }

    #[test]
    fn from_resolver_error_attributes_when_given_action() {
        let id = ActionId::new("@ag/a:1").unwrap();
        let err = ResolverError::Validation("bad field".into());
        let api = ApiError::from_resolver_error(&err, Some(&id));
        assert_eq!(api.action_id.as_deref(), Some("@ag/a:1"));
        assert_eq!(api.code, 400);
    }
}
