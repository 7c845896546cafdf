//! Channel bridge for async consumers.
//!
//! Listeners run synchronously on the dispatching thread. Consumers that
//! need to await (UI state containers, websocket pushers) register a
//! [`ChannelListener`] instead and process events on their own task.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::event_bus::{EventBus, SyncEvent};
use super::event_types::{ComponentType, EventType};
use super::registry::{ComponentRegistration, SyncListener};
use crate::{ListenerError, SyncError};

/// Per-component channel capacity. A consumer this far behind is treated
/// as failing rather than allowed to grow without bound.
pub const BRIDGE_CHANNEL_CAPACITY: usize = 256;

pub struct ChannelListener {
    tx: mpsc::Sender<SyncEvent>,
}

impl ChannelListener {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl SyncListener for ChannelListener {
    fn on_event(&self, event: &SyncEvent) -> Result<(), ListenerError> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ListenerError::new(
                "bridge channel full, consumer is lagging",
            )),
            Err(TrySendError::Closed(_)) => Err(ListenerError::new("bridge receiver dropped")),
        }
    }
}

impl EventBus {
    /// Register `component_id` with a channel-backed listener and return
    /// the receiving end.
    pub fn subscribe_channel(
        &self,
        component_id: &str,
        component_type: ComponentType,
        event_types: impl IntoIterator<Item = EventType>,
        priority: u8,
    ) -> Result<mpsc::Receiver<SyncEvent>, SyncError> {
        let (listener, rx) = ChannelListener::new(BRIDGE_CHANNEL_CAPACITY);
        let registration =
            ComponentRegistration::with_listener(component_id, component_type, Arc::new(listener))
                .subscribe_all(event_types)
                .priority(priority);
        self.register_component(registration)?;
        Ok(rx)
    }
}
