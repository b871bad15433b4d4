//! Clock port (spec §6 "Clock/UUID port", `Now()`).

use kestrel_core::Timestamp;

/// Port for reading the current time as a watermark value.
///
/// Kept separate from [`std::time::SystemTime`] so tests can inject a
/// deterministic or manually-advanced clock; the watermark protocol
/// (spec §4.2.2) only ever compares two [`Timestamp`]s for difference, never
/// against wall-clock time, so a fake clock is a legitimate driver.
pub trait ClockPort: Send + Sync {
    /// Read the current time as a watermark.
    fn now(&self) -> Timestamp;
}

/// [`ClockPort`] backed by [`std::time::SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> Timestamp {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as f64;
        Timestamp::from_nanos(nanos)
    }
}
