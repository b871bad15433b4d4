//! The per-request in-flight set (spec §4.2 invariant: two tasks of the same
//! graph never run the same `actionID` concurrently).
//!
//! Grounded on the teacher's `nebula-resilience` RAII-guard pattern: claiming
//! a slot returns a guard whose `Drop` releases it, so a panicking or
//! early-returning task can never leave a resource wedged in-flight forever.

use std::sync::Arc;

use dashmap::DashSet;
use kestrel_core::ActionId;

/// Holds a claimed in-flight slot for one `ActionId`; releases it on drop.
pub struct InflightGuard {
    set: Arc<DashSet<ActionId>>,
    action_id: ActionId,
}

impl InflightGuard {
    /// Try to claim `action_id`. Returns `None` if another task already
    /// holds it.
    #[must_use]
    pub fn acquire(set: &Arc<DashSet<ActionId>>, action_id: ActionId) -> Option<Self> {
        if set.insert(action_id.clone()) {
            Some(Self {
                set: Arc::clone(set),
                action_id,
            })
        } else {
            None
        }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.action_id);
    }
}
