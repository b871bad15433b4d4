//! The scheduling and execution engine (spec §4.2, C2): wave-parallel
//! dependency resolution over a workflow's resources, dispatching each
//! resource's typed body through the watermark protocol and assembling the
//! final response.
//!
//! Grounded on the teacher's `nebula-engine` crate split: a resolver facade
//! owning shared per-request state behind `Arc`, with small focused modules
//! underneath for the pieces that have independent invariants worth testing
//! in isolation (timeout parsing, truthiness, in-flight tracking, the
//! watermark poll loop).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod inflight;
pub mod ports;
pub mod request;
pub mod resolver;
pub mod timeout;
pub mod truthy;
pub mod watermark;

pub use inflight::InflightGuard;
pub use ports::EnginePorts;
pub use request::RequestContext;
pub use resolver::Resolver;
pub use timeout::StepTimeout;
pub use truthy::is_truthy;
pub use watermark::process_resource_step;
