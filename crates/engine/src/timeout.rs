//! Per-step timeout resolution, including the "-1 means no wait" test-mode
//! convention of spec §4.2.2.
//!
//! [`kestrel_config::EnvConfig`] parses `TIMEOUT` as a `u64` of seconds, so a
//! negative value never survives that parse — the sentinel would silently
//! fall back to the 60s default. [`StepTimeout`] is read from the raw
//! environment separately so the convention isn't lost; see [`DESIGN.md`]
//! for the recorded decision.

use std::time::Duration;

/// A resolved per-step timeout: either wait up to a bound, or don't wait at
/// all (the test-mode convention triggered by `TIMEOUT=-1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTimeout {
    /// Wait up to this long for the watermark to change.
    Wait(Duration),
    /// Don't wait; treat the step as complete as soon as the handler returns.
    NoWait,
}

impl StepTimeout {
    /// Resolve a signed second count per spec §4.2.2 step 2: negative means
    /// "no wait" (test mode), otherwise wait that many seconds.
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds < 0 {
            Self::NoWait
        } else {
            Self::Wait(Duration::from_secs(seconds as u64))
        }
    }

    /// Resolve from the raw `TIMEOUT` environment variable, falling back to
    /// [`kestrel_config::EnvConfig::DEFAULT_TIMEOUT_SECS`] when unset or
    /// unparseable as a signed integer.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .map(Self::from_seconds)
            .unwrap_or(Self::Wait(Duration::from_secs(
                kestrel_config::EnvConfig::DEFAULT_TIMEOUT_SECS,
            )))
    }
}
