//! The watermark [`Timestamp`] used by the step protocol (spec §3, §4.2.2).
//!
//! A `Timestamp` is never read for its absolute value — only compared for
//! *change* against a value captured before a step ran. This is what lets
//! the scheduler treat it as a happens-before edge instead of a clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A duration-valued watermark, `{value: f64, unit: nanosecond}` per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    /// The value, in nanoseconds.
    value: f64,
}

impl Timestamp {
    /// Construct a timestamp from a raw nanosecond value.
    #[must_use]
    pub fn from_nanos(value: f64) -> Self {
        Self { value }
    }

    /// Construct a timestamp from a [`Duration`].
    #[must_use]
    pub fn from_duration(d: Duration) -> Self {
        Self {
            value: d.as_nanos() as f64,
        }
    }

    /// The zero watermark — the value stored before any step has ever run.
    #[must_use]
    pub fn epoch() -> Self {
        Self { value: 0.0 }
    }

    /// The raw nanosecond value.
    #[must_use]
    pub fn as_nanos(&self) -> f64 {
        self.value
    }

    /// Returns `true` if `self` differs from `other` — the only comparison
    /// the watermark protocol (§4.2.2, §8 invariant 3) is permitted to make.
    #[must_use]
    pub fn differs_from(&self, other: Timestamp) -> bool {
        self.value != other.value
    }
}
