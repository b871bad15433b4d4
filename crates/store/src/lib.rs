//! The request-scoped key/value store (spec §4.4, C4 "pklres").
//!
//! A single table keyed by `(requestID, collection, key)` backs every
//! handler's output. Grounded on the teacher's `ports::error::PortsError`
//! shape for the store's own error type and on the
//! `dashmap`-behind-a-sync-façade pattern used throughout the pack for
//! shared mutable state that must stay lock-free on the read path — the
//! store itself never suspends; suspension only happens in the
//! timestamp-watermark poll built on top of it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

pub use error::StoreError;

use dashmap::DashMap;
use kestrel_core::{codec, RequestId};

type StoreKey = (RequestId, String, String);

/// The request-scoped key/value store.
///
/// One `PklresStore` is shared (via `Arc`) across all handlers processing a
/// single request; the `requestID` component of every key is the graph-id,
/// so distinct requests sharing a process never collide (spec §1 Non-goals:
/// "strong consistency across concurrent requests sharing the same graph-id"
/// is explicitly not required — each request has its own graph-id).
#[derive(Debug, Default)]
pub struct PklresStore {
    table: DashMap<StoreKey, String>,
}

impl PklresStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn check_canonical(collection: &str) -> Result<(), StoreError> {
        if collection.starts_with('@') {
            Ok(())
        } else {
            Err(StoreError::NotCanonical(collection.to_owned()))
        }
    }

    /// Overwrite the value at `(collection, key)`. `value` is base64-encoded
    /// before storage; encoding is idempotent (spec invariant 2).
    ///
    /// # Errors
    ///
    /// [`StoreError::NotCanonical`] if `collection` does not start with `@`.
    pub fn set(
        &self,
        request_id: RequestId,
        collection: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        Self::check_canonical(collection)?;
        let encoded = codec::encode_idempotent(value);
        self.table
            .insert((request_id, collection.to_owned(), key.to_owned()), encoded);
        Ok(())
    }

    /// Read the value at `(collection, key)`, base64-decoding it back to the
    /// original string.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no value has been set, or
    /// [`StoreError::Codec`] if the stored value is corrupt.
    pub fn get(&self, request_id: RequestId, collection: &str, key: &str) -> Result<String, StoreError> {
        let stored = self
            .table
            .get(&(request_id, collection.to_owned(), key.to_owned()))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                key: key.to_owned(),
            })?;
        Ok(codec::decode(&stored)?)
    }

    /// List the keys present in `collection` for `request_id` as of this
    /// call (a consistent snapshot, spec §4.4 concurrency note).
    #[must_use]
    pub fn list(&self, request_id: RequestId, collection: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .table
            .iter()
            .filter(|entry| {
                let (rid, coll, _) = entry.key();
                *rid == request_id && coll == collection
            })
            .map(|entry| entry.key().2.clone())
            .collect();
        keys.sort();
        keys
    }
}
