//! Tracing subscriber initialization for the Kestrel resolver engine.
//!
//! A thin wrapper, not a full logging framework — grounded on the teacher's
//! `nebula-log` presets (`development()`/`production()`/env-driven level and
//! format) but reduced to what a library crate needs. File rotation, OTLP
//! export and Sentry integration are deployment concerns that belong to the
//! CLI/container entry point, which spec §1 places out of scope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use tracing_subscriber::EnvFilter;

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable compact text (the default).
    Compact,
    /// Newline-delimited JSON, suitable for log aggregation.
    Json,
}

/// Error installing the global tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A global subscriber was already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Install a global `tracing` subscriber.
///
/// The filter defaults to `info` and honours `RUST_LOG` when set, matching
/// the teacher's env-override convention. Returns [`LogError::AlreadyInitialized`]
/// if a subscriber is already installed (e.g. called twice in one process, or
/// from a test harness that already set one up) — callers that don't care
/// should ignore the error.
pub fn init(format: Format) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match format {
        Format::Compact => builder.compact().try_init(),
        Format::Json => builder.json().try_init(),
    };

    result.map_err(|_| LogError::AlreadyInitialized)
}

/// Convenience preset: compact format, honours `RUST_LOG`.
pub fn init_default() -> Result<(), LogError> {
    init(Format::Compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_default_succeeds_or_reports_already_initialized() {
        // Tests in the same binary share a global subscriber slot; either
        // outcome is acceptable here, we're only checking it doesn't panic.
        let _ = init_default();
    }

    #[test]
    fn format_variants_are_distinct() {
        assert_ne!(Format::Compact, Format::Json);
    }
}
