//! Shared error taxonomy (spec §7) and append-only per-request error
//! registry (spec §6) for the Kestrel resolver engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod registry;
pub mod taxonomy;

pub use registry::ErrorRegistry;
pub use taxonomy::{ApiError, ResolverError};
