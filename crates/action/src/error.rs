//! Error type returned by resource handlers (spec §4.3, §7).
//!
//! Handlers only ever return a *step* error — transport or protocol
//! failures. Domain failures (non-2xx HTTP, non-zero exit, empty LLM
//! choices) are recorded onto the block itself and never surface here; the
//! scheduler decides fatality for those separately (spec §7).

use kestrel_ports::PortsError;
use kestrel_store::StoreError;

/// Error returned by a resource handler's `handle` call.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The underlying port's call failed (connection refused, process
    /// spawn failure, filesystem I/O error, cancellation).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level failure: malformed tool-call arguments, a
    /// reference to an undeclared tool, a corrupt stored value.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<PortsError> for ActionError {
    fn from(err: PortsError) -> Self {
        match err {
            PortsError::Serialization(msg) => Self::Protocol(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
