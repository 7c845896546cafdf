use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use uuid::Uuid;

use super::event_types::{EventType, Priority};
use super::helpers;
use super::metrics::{PerformanceMonitor, SyncPerformanceMetrics};
use super::registry::{ComponentRegistration, ComponentRegistry, Subscriber, MAX_COMPONENT_PRIORITY};
use super::scheduler::{AutoRefreshConfig, AutoRefreshScheduler, RefreshSink, REFRESH_SOURCE};
use super::snapshot::{DataSnapshot, DataSnapshotStore};
use crate::config::SyncConfig;
use crate::{ListenerError, SyncError};

/// Source recorded on events the bus emits about itself.
pub const BUS_SOURCE: &str = "sync_engine";

#[derive(Debug, Clone, Serialize)]
pub struct SyncEvent {
    pub id: String,
    pub seq: u64,
    pub event_type: EventType,
    pub source: String,
    pub payload: Value,
    pub priority: Priority,
    #[serde(skip)]
    pub timestamp: Instant,
    pub created_at: DateTime<Utc>,
}

impl SyncEvent {
    pub(crate) fn new(
        seq: u64,
        event_type: EventType,
        source: impl Into<String>,
        payload: Value,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seq,
            event_type,
            source: source.into(),
            payload,
            priority,
            timestamp: Instant::now(),
            created_at: Utc::now(),
        }
    }
}

/// Caller-supplied part of an event. The bus fills in id, sequence and
/// timestamps; `priority` falls back to the event type's policy.
#[derive(Debug, Clone)]
pub struct EmitRequest {
    pub event_type: EventType,
    pub source: String,
    pub payload: Value,
    pub priority: Option<Priority>,
    // Set by the typed helpers: the snapshot slot value sits under the
    // category key instead of being the whole payload.
    pub(crate) enveloped: bool,
}

impl EmitRequest {
    pub fn new(event_type: EventType, source: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type,
            source: source.into(),
            payload,
            priority: None,
            enveloped: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub(crate) fn enveloped(mut self) -> Self {
        self.enveloped = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Active,
    Disposed,
}

/// Event waiting behind the in-flight dispatch. Higher event priority
/// first, then emission order.
struct PendingEvent {
    event: SyncEvent,
    enveloped: bool,
}

impl PartialEq for PendingEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for PendingEvent {}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.event
            .priority
            .cmp(&other.event.priority)
            .then_with(|| other.event.seq.cmp(&self.event.seq))
    }
}

struct BusState {
    lifecycle: EngineState,
    next_seq: u64,
    pending: BinaryHeap<PendingEvent>,
    dispatching: bool,
    snapshot: DataSnapshotStore,
    monitor: PerformanceMonitor,
}

pub(crate) struct BusCore {
    config: SyncConfig,
    registry: ComponentRegistry,
    state: Mutex<BusState>,
}

struct ListenerFailure {
    component_id: String,
    error: ListenerError,
}

impl BusCore {
    fn new(config: SyncConfig) -> Self {
        let monitor = PerformanceMonitor::new(
            Duration::from_secs(config.refresh_rate_window_secs),
            config.memory_budget_bytes,
        );
        Self {
            registry: ComponentRegistry::new(),
            state: Mutex::new(BusState {
                lifecycle: EngineState::Uninitialized,
                next_seq: 0,
                pending: BinaryHeap::new(),
                dispatching: false,
                snapshot: DataSnapshotStore::new(),
                monitor,
            }),
            config,
        }
    }

    // Listeners never run while this is held, so poisoning can only come
    // from a bug in the bus itself; keep serving rather than cascade.
    fn lock_state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_event(&self, request: EmitRequest) -> String {
        let (id, owns_dispatch) = self.enqueue(request);
        if owns_dispatch {
            self.drain();
        }
        id
    }

    /// Queue an event. Returns its id and whether the caller must drain
    /// the queue (no dispatch was in flight).
    fn enqueue(&self, request: EmitRequest) -> (String, bool) {
        let mut state = self.lock_state();
        let priority = request
            .priority
            .unwrap_or_else(|| request.event_type.default_priority());
        let event = SyncEvent::new(
            state.next_seq,
            request.event_type,
            request.source,
            request.payload,
            priority,
        );
        let id = event.id.clone();

        match state.lifecycle {
            EngineState::Disposed => {
                tracing::warn!(
                    event_type = %event.event_type,
                    source = %event.source,
                    "emit on disposed sync engine ignored"
                );
                return (id, false);
            }
            EngineState::Uninitialized => state.lifecycle = EngineState::Active,
            EngineState::Active => {}
        }

        if state.pending.len() >= self.config.max_pending_events {
            tracing::warn!(
                event_type = %event.event_type,
                pending = state.pending.len(),
                "sync engine queue full, dropping event"
            );
            state.monitor.record_drop();
            return (id, false);
        }

        state.next_seq += 1;
        state.pending.push(PendingEvent {
            event,
            enveloped: request.enveloped,
        });
        if state.dispatching {
            return (id, false);
        }
        state.dispatching = true;
        (id, true)
    }

    /// Dispatch queued events until the queue is empty. Only one caller
    /// drains at a time; events emitted meanwhile are picked up here.
    fn drain(&self) {
        loop {
            let (event, subscribers) = {
                let mut state = self.lock_state();
                if state.lifecycle == EngineState::Disposed {
                    state.pending.clear();
                    state.dispatching = false;
                    return;
                }
                let Some(PendingEvent { event, enveloped }) = state.pending.pop() else {
                    state.dispatching = false;
                    return;
                };
                state.snapshot.apply(&event, enveloped);
                let subscribers = self.registry.subscribers_for(event.event_type);
                (event, subscribers)
            };

            let started = std::time::Instant::now();
            let failures = self.deliver(&event, &subscribers);
            let elapsed = started.elapsed();

            {
                let mut state = self.lock_state();
                state.monitor.record_dispatch(Instant::now(), elapsed);
                for _ in &failures {
                    state.monitor.record_error();
                }
            }

            self.report_follow_ups(&event, &failures, elapsed);
        }
    }

    fn deliver(&self, event: &SyncEvent, subscribers: &[Subscriber]) -> Vec<ListenerFailure> {
        let mut failures = Vec::new();
        for subscriber in subscribers {
            match invoke_listener(subscriber, event) {
                Ok(()) => {
                    self.registry
                        .record_delivery(&subscriber.component_id, subscriber.order, Utc::now());
                }
                Err(error) => {
                    tracing::warn!(
                        component_id = %subscriber.component_id,
                        event_type = %event.event_type,
                        event_id = %event.id,
                        error = %error,
                        "listener failed"
                    );
                    failures.push(ListenerFailure {
                        component_id: subscriber.component_id.clone(),
                        error,
                    });
                }
            }
        }
        failures
    }

    /// Optional events describing the dispatch that just finished. They are
    /// queued behind it like any re-entrant emission.
    fn report_follow_ups(&self, event: &SyncEvent, failures: &[ListenerFailure], elapsed: Duration) {
        if self.config.report_listener_errors && event.event_type != EventType::ErrorOccurred {
            for failure in failures {
                let request = helpers::error_occurred_request(
                    BUS_SOURCE,
                    format!("listener '{}' failed", failure.component_id),
                    Some(json!({
                        "componentId": failure.component_id,
                        "eventId": event.id,
                        "eventType": event.event_type,
                        "error": failure.error.to_string(),
                    })),
                );
                self.enqueue(request);
            }
        }

        if let Some(threshold_ms) = self.config.slow_dispatch_threshold_ms {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            if event.event_type != EventType::PerformanceWarning && elapsed_ms > threshold_ms as f64 {
                tracing::debug!(event_type = %event.event_type, elapsed_ms, "slow dispatch");
                self.enqueue(helpers::performance_warning_request(
                    BUS_SOURCE,
                    json!({
                        "eventId": event.id,
                        "eventType": event.event_type,
                        "elapsedMs": elapsed_ms,
                        "thresholdMs": threshold_ms,
                    }),
                ));
            }
        }
    }
}

impl RefreshSink for BusCore {
    fn on_refresh_tick(&self, tick: u64) {
        self.emit_event(helpers::periodic_refresh_request(REFRESH_SOURCE, tick));
    }
}

/// Run one listener, turning a panic into an ordinary failure.
fn invoke_listener(subscriber: &Subscriber, event: &SyncEvent) -> Result<(), ListenerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| subscriber.listener.on_event(event))) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ListenerError(format!("listener panicked: {message}")))
        }
    }
}

/// In-process publish/subscribe hub shared by dashboard components.
///
/// Construct one per dashboard and share it behind an `Arc`. All methods
/// take `&self`.
pub struct EventBus {
    core: Arc<BusCore>,
    scheduler: AutoRefreshScheduler,
}

impl EventBus {
    /// Build a bus from validated settings.
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: SyncConfig) -> Self {
        let scheduler = AutoRefreshScheduler::new(config.default_refresh_interval_ms);
        Self {
            core: Arc::new(BusCore::new(config)),
            scheduler,
        }
    }

    /// Insert or replace the registration keyed by its `component_id`.
    ///
    /// Ignored (with a warning) once the bus is disposed.
    pub fn register_component(&self, registration: ComponentRegistration) -> Result<(), SyncError> {
        if registration.component_id.trim().is_empty() {
            return Err(SyncError::Configuration("component_id must not be empty".into()));
        }
        if registration.priority > MAX_COMPONENT_PRIORITY {
            return Err(SyncError::Configuration(format!(
                "priority {} for '{}' exceeds {MAX_COMPONENT_PRIORITY}",
                registration.priority, registration.component_id
            )));
        }

        let mut state = self.core.lock_state();
        match state.lifecycle {
            EngineState::Disposed => {
                tracing::warn!(
                    component_id = %registration.component_id,
                    "register on disposed sync engine ignored"
                );
                return Ok(());
            }
            EngineState::Uninitialized => state.lifecycle = EngineState::Active,
            EngineState::Active => {}
        }

        let component_id = registration.component_id.clone();
        let priority = registration.priority;
        let replaced = self.core.registry.insert(registration);
        tracing::debug!(%component_id, priority, replaced, "component registered");
        Ok(())
    }

    /// Remove a registration. Unknown ids are ignored.
    pub fn unregister_component(&self, component_id: &str) {
        if self.state() == EngineState::Disposed {
            tracing::warn!(%component_id, "unregister on disposed sync engine ignored");
            return;
        }
        if self.core.registry.remove(component_id) {
            tracing::debug!(%component_id, "component unregistered");
        }
    }

    /// Pause or resume delivery to a component without unregistering it.
    /// Returns false if the component is unknown.
    pub fn set_component_active(&self, component_id: &str, is_active: bool) -> bool {
        if self.state() == EngineState::Disposed {
            tracing::warn!(%component_id, "set_component_active on disposed sync engine ignored");
            return false;
        }
        self.core.registry.set_active(component_id, is_active)
    }

    pub fn component(&self, component_id: &str) -> Option<ComponentRegistration> {
        self.core.registry.get(component_id)
    }

    /// Emit an event and return its id.
    ///
    /// When called from inside a listener (or while another thread is
    /// dispatching) the event is queued and delivered once the current
    /// dispatch finishes.
    pub fn emit_event(&self, request: EmitRequest) -> String {
        self.core.emit_event(request)
    }

    /// Enable, retune or disable the periodic `DATA_GENERATED` refresh.
    ///
    /// Ignored once the bus is disposed; the scheduler is closed by
    /// `dispose` under its own lock, so no timer can start afterwards.
    pub fn configure_auto_refresh(&self, enabled: bool, interval_ms: Option<u64>) -> Result<(), SyncError> {
        let core: Arc<dyn RefreshSink> = self.core.clone();
        self.scheduler.configure(Arc::downgrade(&core), enabled, interval_ms)
    }

    pub fn auto_refresh_config(&self) -> AutoRefreshConfig {
        self.scheduler.config()
    }

    pub fn get_current_data_snapshot(&self) -> Option<DataSnapshot> {
        self.core.lock_state().snapshot.current()
    }

    pub fn get_performance_metrics(&self) -> SyncPerformanceMetrics {
        let state = self.core.lock_state();
        state.monitor.report(
            Instant::now(),
            self.core.registry.len(),
            self.core.registry.active_len(),
            state.snapshot.estimated_bytes(),
        )
    }

    pub fn state(&self) -> EngineState {
        self.core.lock_state().lifecycle
    }

    /// Stop the refresh timer, drop every registration and cached snapshot,
    /// and refuse further mutation. Calling it again is harmless. Metrics
    /// stay readable.
    ///
    /// Called from a listener, the event being delivered still reaches the
    /// rest of its subscriber list; queued events are discarded.
    pub fn dispose(&self) {
        self.scheduler.close();
        let mut state = self.core.lock_state();
        if state.lifecycle == EngineState::Disposed {
            return;
        }
        state.lifecycle = EngineState::Disposed;
        state.pending.clear();
        state.snapshot.clear();
        self.core.registry.clear();
        tracing::info!(total_events = state.monitor.total_events(), "sync engine disposed");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_valid_config(SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event_types::ComponentType;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    type CallLog = Arc<StdMutex<Vec<String>>>;

    fn recording(bus: &EventBus, log: &CallLog, id: &str, priority: u8, types: &[EventType]) {
        let log = log.clone();
        let name = id.to_string();
        bus.register_component(
            ComponentRegistration::new(id, ComponentType::Chart, move |_| {
                log.lock().unwrap().push(name.clone());
                Ok(())
            })
            .subscribe_all(types.iter().copied())
            .priority(priority),
        )
        .unwrap();
    }

    #[test]
    fn test_pending_queue_orders_by_priority_then_seq() {
        let pending = |seq, event_type, priority| PendingEvent {
            event: SyncEvent::new(seq, event_type, "t", Value::Null, priority),
            enveloped: false,
        };
        let mut heap = BinaryHeap::new();
        heap.push(pending(0, EventType::DataGenerated, Priority::Low));
        heap.push(pending(1, EventType::ErrorOccurred, Priority::Critical));
        heap.push(pending(2, EventType::DataGenerated, Priority::Low));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|p| p.event.seq)).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let bus = EventBus::default();
        assert_eq!(bus.state(), EngineState::Uninitialized);
        bus.emit_event(EmitRequest::new(EventType::DataGenerated, "t", Value::Null));
        assert_eq!(bus.state(), EngineState::Active);
        bus.dispose();
        assert_eq!(bus.state(), EngineState::Disposed);
        bus.dispose();
        assert_eq!(bus.state(), EngineState::Disposed);
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let config = SyncConfig {
            max_pending_events: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(EventBus::new(config), Err(SyncError::Configuration(_))));

        let config = SyncConfig {
            refresh_rate_window_secs: 0,
            ..SyncConfig::default()
        };
        assert!(EventBus::new(config).is_err());
        assert!(EventBus::new(SyncConfig::default()).is_ok());
    }

    #[test]
    fn test_dispose_from_listener_finishes_current_event_only() {
        let bus = Arc::new(EventBus::default());
        let log: CallLog = Arc::new(StdMutex::new(Vec::new()));

        let inner_bus = Arc::downgrade(&bus);
        let inner_log = log.clone();
        bus.register_component(
            ComponentRegistration::new("closer", ComponentType::Dashboard, move |event| {
                inner_log.lock().unwrap().push(format!("closer:{}", event.event_type));
                if let Some(bus) = inner_bus.upgrade() {
                    bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "closer", json!({})));
                    bus.dispose();
                }
                Ok(())
            })
            .subscribe(EventType::PersonaChanged)
            .priority(10),
        )
        .unwrap();
        recording(
            &bus,
            &log,
            "late",
            1,
            &[EventType::PersonaChanged, EventType::ChartInteraction],
        );

        bus.emit_event(EmitRequest::new(EventType::PersonaChanged, "ui", json!({})));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["closer:PERSONA_CHANGED".to_string(), "late".to_string()]
        );
        assert_eq!(bus.state(), EngineState::Disposed);
        assert_eq!(bus.get_performance_metrics().total_events, 1);
    }

    #[test]
    fn test_registration_validation() {
        let bus = EventBus::default();
        let empty = ComponentRegistration::new("  ", ComponentType::Chart, |_| Ok(()));
        assert!(matches!(bus.register_component(empty), Err(SyncError::Configuration(_))));

        let too_high = ComponentRegistration::new("c", ComponentType::Chart, |_| Ok(())).priority(11);
        assert!(matches!(bus.register_component(too_high), Err(SyncError::Configuration(_))));
        assert_eq!(bus.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_reentrant_emit_is_deferred_until_dispatch_completes() {
        let bus = Arc::new(EventBus::default());
        let log: CallLog = Arc::new(StdMutex::new(Vec::new()));

        let inner_bus = Arc::downgrade(&bus);
        let inner_log = log.clone();
        bus.register_component(
            ComponentRegistration::new("relay", ComponentType::Filter, move |event| {
                inner_log.lock().unwrap().push(format!("relay:{}", event.event_type));
                if event.event_type == EventType::FilterApplied {
                    if let Some(bus) = inner_bus.upgrade() {
                        bus.emit_event(EmitRequest::new(EventType::AnalyticsUpdated, "relay", json!({})));
                    }
                    inner_log.lock().unwrap().push("relay:returned".into());
                }
                Ok(())
            })
            .subscribe(EventType::FilterApplied)
            .subscribe(EventType::AnalyticsUpdated)
            .priority(9),
        )
        .unwrap();
        recording(&bus, &log, "table", 1, &[EventType::FilterApplied]);

        bus.emit_event(EmitRequest::new(EventType::FilterApplied, "ui", json!({})));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "relay:FILTER_APPLIED".to_string(),
                "relay:returned".to_string(),
                "table".to_string(),
                "relay:ANALYTICS_UPDATED".to_string(),
            ]
        );
        assert_eq!(bus.get_performance_metrics().total_events, 2);
    }

    #[test]
    fn test_reentrant_events_drain_by_priority() {
        let bus = Arc::new(EventBus::default());
        let log: CallLog = Arc::new(StdMutex::new(Vec::new()));

        let inner_bus = Arc::downgrade(&bus);
        bus.register_component(
            ComponentRegistration::new("fanout", ComponentType::Dashboard, move |_| {
                if let Some(bus) = inner_bus.upgrade() {
                    bus.emit_event(EmitRequest::new(EventType::DataGenerated, "fanout", json!({})));
                    bus.emit_event(EmitRequest::new(EventType::SettingsChanged, "fanout", json!({})));
                }
                Ok(())
            })
            .subscribe(EventType::PersonaChanged),
        )
        .unwrap();
        recording(
            &bus,
            &log,
            "observer",
            5,
            &[EventType::DataGenerated, EventType::SettingsChanged],
        );
        let observed_types: CallLog = Arc::new(StdMutex::new(Vec::new()));
        let types_log = observed_types.clone();
        bus.register_component(
            ComponentRegistration::new("typer", ComponentType::Monitor, move |event| {
                types_log.lock().unwrap().push(event.event_type.to_string());
                Ok(())
            })
            .subscribe(EventType::DataGenerated)
            .subscribe(EventType::SettingsChanged),
        )
        .unwrap();

        bus.emit_event(EmitRequest::new(EventType::PersonaChanged, "ui", json!({})));

        assert_eq!(
            *observed_types.lock().unwrap(),
            vec!["SETTINGS_CHANGED".to_string(), "DATA_GENERATED".to_string()]
        );
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::default();
        let log: CallLog = Arc::new(StdMutex::new(Vec::new()));
        bus.register_component(
            ComponentRegistration::new("boom", ComponentType::Chart, |_| panic!("render failed"))
                .subscribe(EventType::ChartInteraction)
                .priority(10),
        )
        .unwrap();
        recording(&bus, &log, "after", 0, &[EventType::ChartInteraction]);

        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));

        assert_eq!(*log.lock().unwrap(), vec!["after".to_string()]);
        assert_eq!(bus.get_performance_metrics().errors_count, 1);
    }

    #[test]
    fn test_queue_overflow_drops_and_counts() {
        let config = SyncConfig {
            max_pending_events: 2,
            ..SyncConfig::default()
        };
        let bus = Arc::new(EventBus::new(config).unwrap());
        let inner_bus = Arc::downgrade(&bus);
        bus.register_component(
            ComponentRegistration::new("storm", ComponentType::Monitor, move |_| {
                if let Some(bus) = inner_bus.upgrade() {
                    for _ in 0..5 {
                        bus.emit_event(EmitRequest::new(EventType::DataGenerated, "storm", json!({})));
                    }
                }
                Ok(())
            })
            .subscribe(EventType::PersonaChanged),
        )
        .unwrap();

        bus.emit_event(EmitRequest::new(EventType::PersonaChanged, "ui", json!({})));

        let metrics = bus.get_performance_metrics();
        assert_eq!(metrics.total_events, 3);
        assert_eq!(metrics.dropped_events, 3);
    }

    #[test]
    fn test_listener_errors_can_be_reported_as_events() {
        let config = SyncConfig {
            report_listener_errors: true,
            ..SyncConfig::default()
        };
        let bus = EventBus::new(config).unwrap();
        let seen: Arc<StdMutex<Vec<Value>>> = Arc::new(StdMutex::new(Vec::new()));
        let seen_inner = seen.clone();

        bus.register_component(
            ComponentRegistration::new("broken", ComponentType::Chart, |_| Err("bad data".into()))
                .subscribe(EventType::ChartInteraction)
                .subscribe(EventType::ErrorOccurred),
        )
        .unwrap();
        bus.register_component(
            ComponentRegistration::new("errors", ComponentType::Monitor, move |event| {
                seen_inner.lock().unwrap().push(event.payload.clone());
                Ok(())
            })
            .subscribe(EventType::ErrorOccurred),
        )
        .unwrap();

        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["details"]["componentId"], "broken");
        // The broken listener also failed on ERROR_OCCURRED, which is not re-reported.
        let metrics = bus.get_performance_metrics();
        assert_eq!(metrics.errors_count, 2);
        assert_eq!(metrics.total_events, 2);
    }

    #[test]
    fn test_slow_dispatch_emits_performance_warning() {
        let config = SyncConfig {
            slow_dispatch_threshold_ms: Some(0),
            ..SyncConfig::default()
        };
        let bus = EventBus::new(config).unwrap();
        let warnings: CallLog = Arc::new(StdMutex::new(Vec::new()));
        recording(&bus, &warnings, "monitor", 5, &[EventType::PerformanceWarning]);
        bus.register_component(
            ComponentRegistration::new("sluggish", ComponentType::Chart, |_| {
                std::thread::sleep(Duration::from_millis(5));
                Ok(())
            })
            .subscribe(EventType::ChartInteraction),
        )
        .unwrap();

        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));

        assert_eq!(*warnings.lock().unwrap(), vec!["monitor".to_string()]);
    }

    #[test]
    fn test_delivery_bookkeeping() {
        let bus = EventBus::default();
        let log: CallLog = Arc::new(StdMutex::new(Vec::new()));
        recording(&bus, &log, "chart", 5, &[EventType::ChartInteraction]);

        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));
        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));

        let registration = bus.component("chart").unwrap();
        assert_eq!(registration.update_count, 2);
        assert!(registration.last_update.is_some());
    }

    #[test]
    fn test_explicit_priority_overrides_policy() {
        let bus = Arc::new(EventBus::default());
        let seen: Arc<StdMutex<Vec<Priority>>> = Arc::new(StdMutex::new(Vec::new()));
        let seen_inner = seen.clone();
        bus.register_component(
            ComponentRegistration::new("chart", ComponentType::Chart, move |event| {
                seen_inner.lock().unwrap().push(event.priority);
                Ok(())
            })
            .subscribe(EventType::ChartInteraction),
        )
        .unwrap();

        bus.emit_event(EmitRequest::new(EventType::ChartInteraction, "ui", json!({})));
        bus.emit_event(
            EmitRequest::new(EventType::ChartInteraction, "ui", json!({})).with_priority(Priority::Critical),
        );

        assert_eq!(*seen.lock().unwrap(), vec![Priority::Medium, Priority::Critical]);
    }
}
