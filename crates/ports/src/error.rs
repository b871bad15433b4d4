//! Error type for port operations.
//!
//! Every port method returns `Result<_, PortsError>`. Drivers map their
//! internal failures into these variants so the engine can decide retry and
//! fatality policy (spec §7) without inspecting error messages.

use std::time::Duration;

/// Error type for all capability port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortsError {
    /// Transport-level I/O failure (LLM, HTTP, process, filesystem).
    #[error("transport error: {0}")]
    Transport(String),

    /// Operation exceeded its timeout.
    #[error("timeout: {operation} after {duration:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
        /// How long was waited before giving up.
        duration: Duration,
    },

    /// Referenced entity (tool, file, model) not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. "Tool", "File").
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// Caller-supplied input was rejected before any I/O was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Catch-all for driver-internal failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortsError {
    /// Convenience constructor for [`PortsError::Timeout`].
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Convenience constructor for [`PortsError::NotFound`].
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns `true` for transient failures the engine may legitimately retry.
    ///
    /// Per spec §7, the core itself retries zero times, but this flag lets a
    /// driver or caller distinguish retryable transport failures from
    /// permanent ones when deciding whether to surface or retry upstream.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for PortsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = PortsError::not_found("Tool", "echo");
        assert_eq!(err.to_string(), "Tool not found: echo");
    }

    #[test]
    fn timeout_display() {
        let err = PortsError::timeout("run_process", Duration::from_secs(30));
        assert_eq!(err.to_string(), "timeout: run_process after 30s");
    }

    #[test]
    fn transport_and_timeout_are_retryable() {
        assert!(PortsError::Transport("connection reset".into()).is_retryable());
        assert!(PortsError::timeout("op", Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn not_found_and_internal_are_not_retryable() {
        assert!(!PortsError::not_found("X", "1").is_retryable());
        assert!(!PortsError::Internal("oops".into()).is_retryable());
    }

    #[test]
    fn from_serde_json_error() {
        let bad = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: PortsError = bad.into();
        assert!(matches!(err, PortsError::Serialization(_)));
    }
}
