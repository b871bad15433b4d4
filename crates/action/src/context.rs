//! Shared handler context and the credential-redaction helper (spec §4.3).
//!
//! Grounded on the teacher's `action::context::{SecureString, ActionContext}`:
//! a string wrapper that redacts itself in `Debug`/`Display`, and a
//! constructed-by-the-engine context struct threaded into every handler call.

use std::fmt;
use std::sync::Arc;

use kestrel_core::{ActionId, RequestId};
use kestrel_ports::ClockPort;
use kestrel_store::PklresStore;
use tokio_util::sync::CancellationToken;

/// A string that redacts its contents in `Debug` and `Display`.
///
/// Used for HTTP header/credential values so accidental log output never
/// leaks secrets (spec's ambient hardening note on the HTTP handler).
#[derive(Clone)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Wrap a value for redacted display.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self { inner: value.into() }
    }

    /// Access the underlying value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString(***)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Context threaded into every resource handler call (spec §4.3 "Input").
///
/// `action_id` is always canonical by the time a handler sees it (the
/// engine resolves it through C5 before scheduling). `item_index` is set
/// when `has_items` is true and distinguishes the fan-out iteration this
/// call is processing (spec §4.2.3).
#[non_exhaustive]
pub struct HandlerContext {
    /// Graph-id namespacing this request's store entries.
    pub request_id: RequestId,
    /// Canonical action id of the resource being processed.
    pub action_id: ActionId,
    /// Whether this resource has a non-empty `items` fan-out set.
    pub has_items: bool,
    /// Which iteration this call is processing, when `has_items` is true.
    pub item_index: Option<usize>,
    /// The request-scoped key/value store.
    pub store: Arc<PklresStore>,
    /// Watermark clock.
    pub clock: Arc<dyn ClockPort>,
    /// Root of the per-request shared volume (`KDEPS_SHARED_VOLUME_PATH`).
    pub shared_volume_path: String,
    /// Cooperative cancellation signal, checked before and after I/O.
    pub cancellation: CancellationToken,
}

impl HandlerContext {
    /// Construct a context for a resource with no fan-out.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        action_id: ActionId,
        store: Arc<PklresStore>,
        clock: Arc<dyn ClockPort>,
        shared_volume_path: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            action_id,
            has_items: false,
            item_index: None,
            store,
            clock,
            shared_volume_path: shared_volume_path.into(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Derive a context for the `index`-th fan-out iteration of the same
    /// resource (spec §4.2.3).
    #[must_use]
    pub fn for_item(&self, index: usize) -> Self {
        Self {
            request_id: self.request_id,
            action_id: self.action_id.clone(),
            has_items: true,
            item_index: Some(index),
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            shared_volume_path: self.shared_volume_path.clone(),
            cancellation: self.cancellation.clone(),
        }
    }

    /// The pklres collection this call's outputs are stored under: the
    /// canonical action id, suffixed `:item-<n>` when fanning out (spec
    /// §4.2.3).
    #[must_use]
    pub fn storage_collection(&self) -> String {
        match self.item_index {
            Some(n) => format!("{}:item-{n}", self.action_id),
            None => self.action_id.as_str().to_owned(),
        }
    }

    /// The per-request filesystem directory artifacts for this resource are
    /// written under: `<sharedVolumePath>/<requestID>/<actionID>`.
    #[must_use]
    pub fn artifact_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.shared_volume_path)
            .join(self.request_id.as_uuid().to_string())
            .join(self.action_id.as_str().trim_start_matches('@').replace('/', "_"))
    }
}
