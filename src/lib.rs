//! Real-time synchronization engine for dashboard UI components.
//!
//! Independently rendered components register with an [`EventBus`],
//! declare which [`EventType`]s they care about and at what priority, and
//! exchange events through it. The bus handles:
//! - Priority-ordered, per-listener isolated delivery
//! - Trampolined re-entrant emission (listeners may emit)
//! - Last-known data snapshots for late subscribers
//! - Periodic auto-refresh ticks
//! - Live performance counters
//!
//! # Architecture
//!
//! - `bus`: event bus, registry, snapshot store, metrics, scheduler, bridge
//! - `config`: engine settings loaded from defaults or `DASHSYNC_*` env vars
//!
//! Rendering, mock data generation and persistence live outside this crate
//! and talk to it only through registration and emission.

pub mod bus;
pub mod config;

pub use bus::{
    AutoRefreshConfig, ChannelListener, ComponentRegistration, ComponentType, DataSnapshot,
    EmitRequest, EngineState, EventBus, EventType, Priority, SyncEvent, SyncListener,
    SyncPerformanceMetrics, REFRESH_CHANGE_TYPE,
};
pub use config::SyncConfig;

// ---------------------------------------------------------------------------
// Shared error types
// ---------------------------------------------------------------------------

/// Errors returned synchronously to the caller of an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Failure reported by a listener while handling an event.
///
/// Listener failures never propagate to the emitter; the bus logs and
/// counts them and moves on to the next listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<serde_json::Error> for ListenerError {
    fn from(err: serde_json::Error) -> Self {
        Self(format!("payload decode failed: {err}"))
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dashsync=debug,info")),
        )
        .try_init();
}
