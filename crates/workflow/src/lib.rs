//! Workflow document model and dependency graph.
//!
//! Loads a request's workflow and its resources into typed structures
//! (`model`) and arranges them into an execution order (`graph`) that the
//! scheduler consumes directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod graph;
pub mod model;

pub use graph::DependencyGraph;
pub use model::{
    ApiResponseBlock, ApiResponseData, ChatBlock, DataBlock, ExecBlock, HttpBlock,
    HttpBlockResponse, MultiChat, PythonBlock, RawResource, RawRunBlock, Resource, RunBlock,
    RunBlockError, RunBody, Tool, ToolParameter, Validation, Workflow, WorkflowSettings,
    METHODS_REQUIRING_BODY,
};
