//! Tool reader port (spec §6 "tool URI", §4.3.1.3).

use async_trait::async_trait;

use crate::error::PortsError;

/// Port for invoking a workflow tool addressed by a `tool:///…` URI.
///
/// The URI (`tool:///<callID>?script=<base64>&params=<urlencoded>`) is
/// constructed by the LLM handler; this port only performs the invocation
/// and returns the tool's textual result.
#[async_trait]
pub trait ToolReaderPort: Send + Sync {
    /// Invoke the tool addressed by `uri` and return its textual result.
    async fn read(&self, uri: &str) -> Result<String, PortsError>;
}
