//! Component registry.
//!
//! Keyed store of subscriptions. Each entry is stamped with a
//! monotonically increasing insertion order so that components sharing a
//! priority are served in the order they registered.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::event_bus::SyncEvent;
use super::event_types::{ComponentType, EventType};
use crate::ListenerError;

/// Highest priority a component may register with.
pub const MAX_COMPONENT_PRIORITY: u8 = 10;

/// Priority given to registrations that do not pick one.
pub const DEFAULT_COMPONENT_PRIORITY: u8 = 5;

/// Callback invoked for each delivered event.
///
/// Listeners run on the dispatching thread and must not block. Anything
/// slow belongs on the listener's own task; see [`super::ChannelListener`].
pub trait SyncListener: Send + Sync {
    fn on_event(&self, event: &SyncEvent) -> Result<(), ListenerError>;
}

impl<F> SyncListener for F
where
    F: Fn(&SyncEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &SyncEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// A subscriber's declaration of what it listens to and at what priority.
#[derive(Clone)]
pub struct ComponentRegistration {
    pub component_id: String,
    pub component_type: ComponentType,
    pub event_types: HashSet<EventType>,
    pub listener: Arc<dyn SyncListener>,
    /// 0..=10, higher is served first.
    pub priority: u8,
    pub is_active: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub update_count: u64,
}

impl ComponentRegistration {
    /// Registration backed by a closure.
    pub fn new<F>(component_id: impl Into<String>, component_type: ComponentType, listener: F) -> Self
    where
        F: Fn(&SyncEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self::with_listener(component_id, component_type, Arc::new(listener))
    }

    pub fn with_listener(
        component_id: impl Into<String>,
        component_type: ComponentType,
        listener: Arc<dyn SyncListener>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            component_type,
            event_types: HashSet::new(),
            listener,
            priority: DEFAULT_COMPONENT_PRIORITY,
            is_active: true,
            last_update: None,
            update_count: 0,
        }
    }

    pub fn subscribe(mut self, event_type: EventType) -> Self {
        self.event_types.insert(event_type);
        self
    }

    pub fn subscribe_all(mut self, event_types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types.extend(event_types);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn listens_to(&self, event_type: EventType) -> bool {
        self.is_active && self.event_types.contains(&event_type)
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("component_id", &self.component_id)
            .field("component_type", &self.component_type)
            .field("event_types", &self.event_types)
            .field("priority", &self.priority)
            .field("is_active", &self.is_active)
            .field("last_update", &self.last_update)
            .field("update_count", &self.update_count)
            .finish_non_exhaustive()
    }
}

/// One entry of a dispatch plan.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub component_id: String,
    pub priority: u8,
    pub order: u64,
    pub listener: Arc<dyn SyncListener>,
}

struct RegistryEntry {
    registration: ComponentRegistration,
    order: u64,
}

#[derive(Default)]
pub(crate) struct ComponentRegistry {
    entries: DashMap<String, RegistryEntry>,
    next_order: AtomicU64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by `component_id`. Returns true if an existing
    /// registration was replaced. A replacement takes a fresh insertion
    /// order, so it sorts after components registered before it.
    pub fn insert(&self, registration: ComponentRegistration) -> bool {
        let order = self.next_order.fetch_add(1, Ordering::Relaxed);
        let key = registration.component_id.clone();
        self.entries
            .insert(key, RegistryEntry { registration, order })
            .is_some()
    }

    pub fn remove(&self, component_id: &str) -> bool {
        self.entries.remove(component_id).is_some()
    }

    pub fn set_active(&self, component_id: &str, is_active: bool) -> bool {
        match self.entries.get_mut(component_id) {
            Some(mut entry) => {
                entry.registration.is_active = is_active;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, component_id: &str) -> Option<ComponentRegistration> {
        self.entries
            .get(component_id)
            .map(|entry| entry.registration.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn active_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.registration.is_active)
            .count()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Active subscribers of `event_type`, highest priority first, then by
    /// insertion order. The returned list is detached from the registry.
    pub fn subscribers_for(&self, event_type: EventType) -> Vec<Subscriber> {
        let mut subscribers: Vec<Subscriber> = self
            .entries
            .iter()
            .filter(|entry| entry.registration.listens_to(event_type))
            .map(|entry| Subscriber {
                component_id: entry.registration.component_id.clone(),
                priority: entry.registration.priority,
                order: entry.order,
                listener: entry.registration.listener.clone(),
            })
            .collect();
        subscribers.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
        subscribers
    }

    /// Bump delivery bookkeeping, unless the component was replaced or
    /// removed since the dispatch plan was taken.
    pub fn record_delivery(&self, component_id: &str, order: u64, at: DateTime<Utc>) {
        if let Some(mut entry) = self.entries.get_mut(component_id) {
            if entry.order == order {
                entry.registration.update_count += 1;
                entry.registration.last_update = Some(at);
            }
        }
    }
}
