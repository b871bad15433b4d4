//! Error type for the key/value store.

/// Error returned by [`crate::PklresStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// `collection` did not begin with `@` (spec invariant 1).
    #[error("pklres collection must be a canonical action id (start with '@'): {0:?}")]
    NotCanonical(String),
    /// No value stored for `(collection, key)`.
    #[error("no pklres value for collection {collection:?} key {key:?}")]
    NotFound {
        /// Collection the lookup targeted.
        collection: String,
        /// Key the lookup targeted.
        key: String,
    },
    /// The stored value failed to base64-decode.
    #[error("stored pklres value is corrupt: {0}")]
    Codec(#[from] kestrel_core::CodecError),
}
