//! Engine settings.
//!
//! Defaults suit an interactive dashboard. Every field can be overridden
//! from a `DASHSYNC_*` environment variable (a `.env` file is honoured).

use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Auto-refresh cadence used when the caller does not pass one (30s).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Trailing window for the refresh-rate statistic.
pub const DEFAULT_REFRESH_RATE_WINDOW_SECS: u64 = 60;

/// Upper bound on events waiting behind an in-flight dispatch.
pub const DEFAULT_MAX_PENDING_EVENTS: usize = 1024;

/// Snapshot size that maps to 100% on the memory gauge (1 MiB).
pub const DEFAULT_MEMORY_BUDGET_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub default_refresh_interval_ms: u64,
    pub refresh_rate_window_secs: u64,
    pub max_pending_events: usize,
    pub memory_budget_bytes: usize,
    /// Emit an `ERROR_OCCURRED` event for every caught listener failure.
    pub report_listener_errors: bool,
    /// Emit a `PERFORMANCE_WARNING` event when one dispatch takes longer
    /// than this many milliseconds.
    pub slow_dispatch_threshold_ms: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            refresh_rate_window_secs: DEFAULT_REFRESH_RATE_WINDOW_SECS,
            max_pending_events: DEFAULT_MAX_PENDING_EVENTS,
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            report_listener_errors: false,
            slow_dispatch_threshold_ms: None,
        }
    }
}

impl SyncConfig {
    /// Load settings from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, SyncError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<u64, _>(&lookup, "DASHSYNC_REFRESH_INTERVAL_MS")? {
            config.default_refresh_interval_ms = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "DASHSYNC_REFRESH_WINDOW_SECS")? {
            config.refresh_rate_window_secs = v;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "DASHSYNC_MAX_PENDING_EVENTS")? {
            config.max_pending_events = v;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "DASHSYNC_MEMORY_BUDGET_BYTES")? {
            config.memory_budget_bytes = v;
        }
        if let Some(v) = parse_var::<bool, _>(&lookup, "DASHSYNC_REPORT_LISTENER_ERRORS")? {
            config.report_listener_errors = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "DASHSYNC_SLOW_DISPATCH_MS")? {
            config.slow_dispatch_threshold_ms = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.default_refresh_interval_ms == 0 {
            return Err(SyncError::Configuration(
                "default_refresh_interval_ms must be greater than zero".into(),
            ));
        }
        if self.refresh_rate_window_secs == 0 {
            return Err(SyncError::Configuration(
                "refresh_rate_window_secs must be greater than zero".into(),
            ));
        }
        if self.max_pending_events == 0 {
            return Err(SyncError::Configuration(
                "max_pending_events must be greater than zero".into(),
            ));
        }
        if self.memory_budget_bytes == 0 {
            return Err(SyncError::Configuration(
                "memory_budget_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, SyncError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| SyncError::Configuration(format!("invalid {key} value '{trimmed}': {e}")))
}
