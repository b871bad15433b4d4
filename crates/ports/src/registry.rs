//! Agent registry port (spec §6 "Agent registry", §4.5).

use async_trait::async_trait;

use crate::error::PortsError;

/// Port for resolving local action IDs against the agent registry.
///
/// The URI shape (`agent:///<actionID>?op=resolve&agent=<agentID>&version=<version>`)
/// is constructed by the caller (the action-ID resolver, C5); this port only
/// performs the read.
#[async_trait]
pub trait AgentRegistryPort: Send + Sync {
    /// Read the bytes addressed by an `agent:///…` URI.
    async fn read(&self, uri: &str) -> Result<Vec<u8>, PortsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_is_object_safe() {
        fn _assert(_: &dyn AgentRegistryPort) {}
    }
}
