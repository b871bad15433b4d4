//! The workflow data model (spec §3).

pub mod chat;
pub mod data;
pub mod http;
pub mod process;
pub mod resource;
pub mod run_block;
pub mod tool;
pub mod workflow;

pub use chat::{ChatBlock, MultiChat};
pub use data::DataBlock;
pub use http::{HttpBlock, HttpBlockResponse, METHODS_REQUIRING_BODY};
pub use process::{ExecBlock, PythonBlock};
pub use resource::{RawResource, Resource};
pub use run_block::{ApiResponseBlock, ApiResponseData, RawRunBlock, RunBlock, RunBlockError, RunBody, Validation};
pub use tool::{Tool, ToolParameter};
pub use workflow::{Workflow, WorkflowSettings};
