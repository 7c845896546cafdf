// tests/common/recorder.rs
//! Listener that records which component saw which event, in call order.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use dashsync::{ComponentRegistration, ComponentType, EventBus, EventType, ListenerError, SyncEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub component_id: String,
    pub event_type: EventType,
    pub payload: serde_json::Value,
}

/// Shared call log. Clones share the same log.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that appends a [`Call`] tagged with `component_id`.
    pub fn listener(
        &self,
        component_id: &str,
    ) -> impl Fn(&SyncEvent) -> Result<(), ListenerError> + Send + Sync + 'static {
        let calls = self.calls.clone();
        let component_id = component_id.to_string();
        move |event| {
            calls.lock().unwrap().push(Call {
                component_id: component_id.clone(),
                event_type: event.event_type,
                payload: event.payload.clone(),
            });
            Ok(())
        }
    }

    /// Register a recording component on `bus`.
    pub fn register(&self, bus: &EventBus, component_id: &str, priority: u8, event_types: &[EventType]) {
        bus.register_component(
            ComponentRegistration::new(component_id, ComponentType::Chart, self.listener(component_id))
                .subscribe_all(event_types.iter().copied())
                .priority(priority),
        )
        .expect("register recording component");
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Component ids in call order.
    pub fn order(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.component_id).collect()
    }

    pub fn count(&self, component_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.component_id == component_id)
            .count()
    }

    pub fn count_type(&self, event_type: EventType) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.event_type == event_type)
            .count()
    }
}
