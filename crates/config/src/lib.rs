//! Environment-variable configuration for the Kestrel resolver engine
//! (spec §6 "Environment variables").
//!
//! Grounded on the teacher's `nebula-config` env-source loader, reduced to a
//! single flat struct — the full hot-reloading, multi-format loader the
//! teacher builds is a concern of the manifest/config layer that spec §1
//! places out of scope for this core.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

/// The four environment variables the resolver core consumes (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// `TIMEOUT` — default per-step handler timeout, in seconds.
    pub default_timeout: Duration,
    /// `KDEPS_SHARED_VOLUME_PATH` — shared filesystem root for per-request
    /// output files (defaults to `/.kdeps/`, per spec §6).
    pub shared_volume_path: String,
    /// `KDEPS_CURRENT_AGENT` — set by the core for downstream tools.
    pub current_agent: Option<String>,
    /// `KDEPS_CURRENT_VERSION` — set by the core for downstream tools.
    pub current_version: Option<String>,
}

impl EnvConfig {
    /// The default handler timeout when `TIMEOUT` is unset (spec §4.2.2).
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// The default shared volume path when `KDEPS_SHARED_VOLUME_PATH` is unset.
    pub const DEFAULT_SHARED_VOLUME_PATH: &'static str = "/.kdeps/";

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Read configuration from an injected lookup function.
    ///
    /// Exists so tests (and, e.g., a CLI entry point that pre-parses flags)
    /// can supply values without mutating the real process environment.
    #[must_use]
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let default_timeout = get("TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS));

        let shared_volume_path = get("KDEPS_SHARED_VOLUME_PATH")
            .unwrap_or_else(|| Self::DEFAULT_SHARED_VOLUME_PATH.to_owned());

        Self {
            default_timeout,
            shared_volume_path,
            current_agent: get("KDEPS_CURRENT_AGENT"),
            current_version: get("KDEPS_CURRENT_VERSION"),
        }
    }
}
