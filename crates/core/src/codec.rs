//! Base64 boundary layer for pklres string persistence (spec §3 invariant 2,
//! §9 design note "Opaque string store, base64 encoding").
//!
//! Every string field persisted through the key/value store is base64-encoded
//! on write and decoded on read. Encoding is idempotent: a value that is
//! already valid base64 is passed through unchanged rather than
//! double-encoded. This mirrors the source behavior exactly — see the open
//! design note in spec §9: a plaintext value that happens to already look
//! like base64 will not round-trip through `decode(encode(x))`, which is an
//! accepted property of this boundary, not a defect.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Error decoding a pklres-persisted string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// The stored value was not valid base64.
    #[error("value is not valid base64")]
    InvalidBase64,
    /// The decoded bytes were not valid UTF-8.
    #[error("decoded value is not valid utf-8")]
    InvalidUtf8,
}

/// Returns `true` if `s` decodes successfully as base64.
#[must_use]
pub fn is_base64(s: &str) -> bool {
    STANDARD.decode(s).is_ok()
}

/// Encode `raw` as base64, unless it is already valid base64 (idempotent).
#[must_use]
pub fn encode_idempotent(raw: &str) -> String {
    if is_base64(raw) {
        raw.to_owned()
    } else {
        STANDARD.encode(raw)
    }
}

/// Decode a base64-encoded pklres value back to its original string.
pub fn decode(value: &str) -> Result<String, CodecError> {
    let bytes = STANDARD.decode(value).map_err(|_| CodecError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}
