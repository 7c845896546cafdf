//! Event system for real-time component synchronization.
//!
//! The event bus provides:
//! - Publish-subscribe delivery ordered by component priority
//! - Per-listener failure isolation
//! - Last-known data snapshots for late subscribers
//! - Periodic auto-refresh events
//!
//! # Architecture
//!
//! Events flow from emitter → EventBus → listeners:
//! - `EventBus`: queues the event, folds it into the snapshot, then calls
//!   each matching listener in priority order
//! - `ComponentRegistry`: who listens to what, at which priority
//! - `AutoRefreshScheduler`: injects `DATA_GENERATED` ticks on a timer
//! - `ChannelListener`: bridges delivery onto a tokio channel for async
//!   consumers

mod bridge;
mod event_bus;
mod event_types;
mod helpers;
mod metrics;
mod registry;
mod scheduler;
mod snapshot;

pub use bridge::{ChannelListener, BRIDGE_CHANNEL_CAPACITY};
pub use event_bus::{EmitRequest, EngineState, EventBus, SyncEvent, BUS_SOURCE};
pub use event_types::{ComponentType, EventType, Priority, SnapshotCategory};
pub use metrics::SyncPerformanceMetrics;
pub use registry::{
    ComponentRegistration, SyncListener, DEFAULT_COMPONENT_PRIORITY, MAX_COMPONENT_PRIORITY,
};
pub use scheduler::{AutoRefreshConfig, REFRESH_CHANGE_TYPE, REFRESH_SOURCE};
pub use snapshot::DataSnapshot;
