//! Core identifier, timestamp and codec types shared across the Kestrel
//! resolver engine crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod id;
pub mod timestamp;

pub use codec::{decode, encode_idempotent, is_base64, CodecError};
pub use id::{ActionId, ActionIdError, CanonicalParts, RequestId};
pub use timestamp::Timestamp;

/// Re-export of the `semver` crate so downstream crates validate the
/// `version` segment of a canonical action id against the same rules used
/// by the workflow document's own `version` field (spec §3).
pub use semver::Version;
