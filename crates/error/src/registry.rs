//! The per-request error registry (spec §6 "Downstream" interface, §3
//! invariant 4: append-only within a request's lifecycle).

use dashmap::DashMap;
use kestrel_core::{ActionId, RequestId};

use crate::taxonomy::ApiError;

/// Append-only collector of [`ApiError`]s, scoped by [`RequestId`].
///
/// Grounded on the teacher's `dashmap`-backed shared-state pattern
/// (`nebula-resilience`, `nebula-execution::context`): a single shared
/// structure, no per-entry locking needed because `DashMap` shards
/// internally and each request only ever appends to its own vector.
#[derive(Debug, Default)]
pub struct ErrorRegistry {
    entries: DashMap<RequestId, Vec<ApiError>>,
}

impl ErrorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error for `request_id`. Never overwrites or removes a prior
    /// entry (invariant 4).
    pub fn add_error(
        &self,
        request_id: RequestId,
        action_id: Option<&ActionId>,
        code: i32,
        message: impl Into<String>,
    ) {
        let entry = match action_id {
            Some(id) => ApiError::for_action(id, code, message),
            None => ApiError::unattributed(code, message),
        };
        self.entries.entry(request_id).or_default().push(entry);
    }

    /// Append an already-built [`ApiError`].
    pub fn add(&self, request_id: RequestId, error: ApiError) {
        self.entries.entry(request_id).or_default().push(error);
    }

    /// Return all errors accumulated for `request_id`, in insertion order.
    #[must_use]
    pub fn get_errors(&self, request_id: RequestId) -> Vec<ApiError> {
        self.entries
            .get(&request_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if no errors have been recorded for `request_id`.
    #[must_use]
    pub fn is_empty(&self, request_id: RequestId) -> bool {
        self.entries
            .get(&request_id)
            .map_or(true, |entries| entries.is_empty())
    }

    /// Drop all errors for `request_id`. Called once the request scope ends
    /// (spec §3 "KV entries ... destroyed with the request scope" applies
    /// equally to the error registry).
    pub fn clear_scope(&self, request_id: RequestId) {
        self.entries.remove(&request_id);
    }
}
