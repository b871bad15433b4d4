//! Bundled capability ports the engine is constructed over (spec §6
//! "Downstream ports").
//!
//! Grounded on the teacher's `nebula-engine` builder pattern of collecting
//! every injected port into one struct rather than threading them through
//! the resolver's constructor as separate positional arguments.

use std::path::PathBuf;
use std::sync::Arc;

use kestrel_ports::{
    AgentRegistryPort, ClockPort, FilesystemPort, HttpPort, LlmPort, ProcessPort, TemplateEvaluatorPort,
    ToolReaderPort,
};

/// Every capability port [`crate::resolver::Resolver::new`] needs, plus the
/// data directory the data handler enumerates (spec §4.3.4).
pub struct EnginePorts {
    /// Model client factory.
    pub llm: Arc<dyn LlmPort>,
    /// Outbound HTTP client.
    pub http: Arc<dyn HttpPort>,
    /// Subprocess runner.
    pub process: Arc<dyn ProcessPort>,
    /// Per-request file I/O.
    pub filesystem: Arc<dyn FilesystemPort>,
    /// Watermark time source.
    pub clock: Arc<dyn ClockPort>,
    /// Action-id resolution backend (spec §4.5, C5).
    pub registry: Arc<dyn AgentRegistryPort>,
    /// Workflow tool invocation (spec §4.3.1.3).
    pub tool_reader: Arc<dyn ToolReaderPort>,
    /// Template rendering for `skipCondition`/`preflightCheck`/`validations`
    /// expressions.
    pub evaluator: Arc<dyn TemplateEvaluatorPort>,
    /// Root directory the data handler enumerates.
    pub data_root: PathBuf,
}
