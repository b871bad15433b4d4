//! Identifiers used throughout the resolver engine.
//!
//! [`ActionId`] wraps the action-identifier string described in spec §3/§4.5.
//! It is intentionally permissive at construction (non-canonical forms such
//! as a bare `"a"` are valid — they exist until [`kestrel-actionid`] resolves
//! them) and exposes [`ActionId::is_canonical`] / [`ActionId::canonical_parts`]
//! for callers that need to enforce or inspect the canonical
//! `@agent/action:version` form.
//!
//! [`RequestId`] is the graph-id that namespaces a single request's pklres
//! entries (§4.4 invariant: concurrent requests never collide).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an [`ActionId`] cannot be constructed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActionIdError {
    /// The input string was empty.
    #[error("action id must not be empty")]
    Empty,
    /// The input string contained whitespace, which action ids never do.
    #[error("action id must not contain whitespace: {0:?}")]
    ContainsWhitespace(String),
}

/// A workflow action identifier.
///
/// May be a short local name (`"a"`, `"hello"`) prior to resolution, or the
/// canonical `@agent/action:version` form. Use [`is_canonical`](Self::is_canonical)
/// to check which.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

/// The three components of a canonical action id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalParts<'a> {
    /// The owning agent name.
    pub agent: &'a str,
    /// The action name within the agent.
    pub action: &'a str,
    /// The semver version string.
    pub version: &'a str,
}

impl ActionId {
    /// Construct an [`ActionId`], rejecting empty or whitespace-bearing input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ActionIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ActionIdError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ActionIdError::ContainsWhitespace(raw));
        }
        Ok(Self(raw))
    }

    /// Build the canonical form `@agent/action:version` directly.
    #[must_use]
    pub fn canonical(agent: &str, action: &str, version: &str) -> Self {
        Self(format!("@{agent}/{action}:{version}"))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this id is in canonical `@agent/action:version` form.
    ///
    /// Canonical means: starts with `@`; contains exactly one `/` splitting
    /// agent from `action:version`; the `action:version` segment contains
    /// exactly one `:`; neither agent, action, nor version is empty.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.canonical_parts().is_some()
    }

    /// Split a canonical id into its `(agent, action, version)` parts.
    ///
    /// Returns `None` if this id is not in canonical form.
    #[must_use]
    pub fn canonical_parts(&self) -> Option<CanonicalParts<'_>> {
        let rest = self.0.strip_prefix('@')?;
        let (agent, tail) = rest.split_once('/')?;
        let (action, version) = tail.split_once(':')?;
        if agent.is_empty() || action.is_empty() || version.is_empty() {
            return None;
        }
        Some(CanonicalParts {
            agent,
            action,
            version,
        })
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActionId {
    type Err = ActionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ActionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for one request-scoped execution (the "graph-id").
///
/// Namespaces all pklres entries so two concurrent requests never share
/// state, even if they target the same workflow (§4.4, Non-goals in §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (used when a port supplies the id, e.g. tests).
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_id_rejects_empty() {
        assert_eq!(ActionId::new(""), Err(ActionIdError::Empty));
    }

    #[test]
    fn action_id_rejects_whitespace() {
        let err = ActionId::new("hello world").unwrap_err();
        assert!(matches!(err, ActionIdError::ContainsWhitespace(_)));
    }

    #[test]
    fn action_id_accepts_local_name() {
        let id = ActionId::new("hello").unwrap();
        assert!(!id.is_canonical());
        assert_eq!(id.as_str(), "hello");
    }

    #[test]
    fn action_id_canonical_parts() {
        let id = ActionId::canonical("ag", "hello", "1.0.0");
        assert!(id.is_canonical());
        let parts = id.canonical_parts().unwrap();
        assert_eq!(parts.agent, "ag");
        assert_eq!(parts.action, "hello");
        assert_eq!(parts.version, "1.0.0");
    }

    #[test]
    fn action_id_canonical_display() {
        let id = ActionId::canonical("ag", "hello", "1.0.0");
        assert_eq!(id.to_string(), "@ag/hello:1.0.0");
    }

    #[test]
    fn action_id_missing_at_is_not_canonical() {
        let id = ActionId::new("ag/hello:1.0.0").unwrap();
        assert!(!id.is_canonical());
    }

    #[test]
    fn action_id_missing_slash_is_not_canonical() {
        let id = ActionId::new("@ag-hello:1.0.0").unwrap();
        assert!(!id.is_canonical());
    }

    #[test]
    fn action_id_missing_colon_is_not_canonical() {
        let id = ActionId::new("@ag/hello-1.0.0").unwrap();
        assert!(!id.is_canonical());
    }

    #[test]
    fn action_id_empty_segment_is_not_canonical() {
        assert!(!ActionId::new("@/hello:1.0.0").unwrap().is_canonical());
        assert!(!ActionId::new("@ag/:1.0.0").unwrap().is_canonical());
        assert!(!ActionId::new("@ag/hello:").unwrap().is_canonical());
    }

    #[test]
    fn action_id_from_str() {
        let id: ActionId = "hello".parse().unwrap();
        assert_eq!(id.as_str(), "hello");
    }

    #[test]
    fn action_id_serde_roundtrip() {
        let id = ActionId::canonical("ag", "hello", "1.0.0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"@ag/hello:1.0.0\"");
        let back: ActionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn action_id_ordering_is_lexical() {
        let a = ActionId::new("@ag/a:1").unwrap();
        let b = ActionId::new("@ag/b:1").unwrap();
        assert!(a < b);
    }

    #[test]
    fn request_id_v4_is_unique() {
        let a = RequestId::new_v4();
        let b = RequestId::new_v4();
        assert_ne!(a, b);
    }

    #[test]
    fn request_id_copy_semantics() {
        let a = RequestId::new_v4();
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn request_id_display_roundtrip() {
        let a = RequestId::new_v4();
        let parsed: RequestId = a.to_string().parse().unwrap();
        assert_eq!(a, parsed);
    }

    #[test]
    fn request_id_serde_roundtrip() {
        let a = RequestId::new_v4();
        let json = serde_json::to_string(&a).unwrap();
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
