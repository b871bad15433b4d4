#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Kestrel Ports
//!
//! Capability port traits for the Kestrel resolver engine.
//!
//! Follows the Ports & Drivers (hexagonal) architecture pattern: the engine
//! and resource handlers depend only on the traits in this crate, never on a
//! concrete LLM SDK, HTTP client, or process runner. Per spec §6:
//!
//! - [`LlmPort`] / [`LlmClient`] -- model clients keyed by model name
//! - [`HttpPort`] -- outbound HTTP requests
//! - [`ProcessPort`] -- subprocess execution
//! - [`FilesystemPort`] -- per-request file I/O
//! - [`ClockPort`] -- watermark time source
//! - [`UuidPort`] -- identifier generation
//! - [`AgentRegistryPort`] -- action-ID resolution backend
//! - [`ToolReaderPort`] -- workflow tool invocation
//! - [`ResourceLoaderPort`] / [`TemplateEvaluatorPort`] -- manifest parsing (out of scope internals)

pub mod clock;
pub mod error;
pub mod evaluator;
pub mod filesystem;
pub mod http;
pub mod llm;
pub mod process;
pub mod registry;
pub mod tool;
pub mod uuid_port;

pub use clock::{ClockPort, SystemClock};
pub use error::PortsError;
pub use evaluator::{ResourceLoaderPort, TemplateEvaluatorPort};
pub use filesystem::FilesystemPort;
pub use http::{HttpPort, HttpRequest, HttpResponse};
pub use llm::{Choice, GenerateOptions, GenerateResponse, LlmClient, LlmPort, Message, Role, ToolCall};
pub use process::{ProcessOutput, ProcessPort, ProcessSpec};
pub use registry::AgentRegistryPort;
pub use tool::ToolReaderPort;
pub use uuid_port::{RandomUuidSource, UuidPort};
