//! Typed resource handlers (spec §4.3, C3).
//!
//! Grounded on the teacher's `action::{context, handler}` split: a shared
//! context struct constructed by the engine, and a narrow handler trait
//! each typed action implements. Unlike the teacher's JSON-erased
//! `InternalHandler`, each Kestrel handler is generic over its own block
//! type — the five run-step kinds are closed and known at compile time, so
//! there is no need to erase them through `serde_json::Value`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod data;
pub mod error;
pub mod http;
pub mod llm;
pub mod process;

pub use context::{HandlerContext, SecureString};
pub use data::DataHandler;
pub use error::ActionError;
pub use http::HttpHandler;
pub use llm::{build_system_prompt, dedupe_tool_calls, map_role, tool_uri, LlmHandler};
pub use process::{ExecHandler, PythonHandler};

/// Shared contract for a typed resource handler (spec §4.3 "All handlers
/// share this contract").
///
/// `block` is mutated in place with the handler's output fields (response
/// text, stdout/stderr, HTTP response, file registry) and a fresh
/// `timestamp`, which is what the watermark protocol in the scheduler
/// (C2) polls for.
#[async_trait::async_trait]
pub trait ResourceHandler<B>: Send + Sync {
    /// Execute the step described by `block` for the resource in `ctx`.
    async fn handle(&self, ctx: &HandlerContext, block: &mut B) -> Result<(), ActionError>;
}
