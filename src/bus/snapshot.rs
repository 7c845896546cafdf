//! Last-known data per category, for components that register late.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::event_bus::SyncEvent;
use super::event_types::SnapshotCategory;

/// Read-only copy of the cached data slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    pub analytics_data: Option<Value>,
    pub settings: Option<Value>,
    pub filters: Option<Value>,
    pub system_metrics: Option<Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DataSnapshot {
    pub fn get(&self, category: SnapshotCategory) -> Option<&Value> {
        match category {
            SnapshotCategory::AnalyticsData => self.analytics_data.as_ref(),
            SnapshotCategory::Settings => self.settings.as_ref(),
            SnapshotCategory::Filters => self.filters.as_ref(),
            SnapshotCategory::SystemMetrics => self.system_metrics.as_ref(),
        }
    }

    fn slot_mut(&mut self, category: SnapshotCategory) -> &mut Option<Value> {
        match category {
            SnapshotCategory::AnalyticsData => &mut self.analytics_data,
            SnapshotCategory::Settings => &mut self.settings,
            SnapshotCategory::Filters => &mut self.filters,
            SnapshotCategory::SystemMetrics => &mut self.system_metrics,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DataSnapshotStore {
    current: DataSnapshot,
    observed: bool,
    // Serialized size per slot, in `SnapshotCategory` declaration order.
    slot_bytes: [usize; 4],
}

impl DataSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into its category slot, if it has one. Last write wins.
    ///
    /// `enveloped` payloads carry the slot value under the category key;
    /// any other payload is stored whole.
    pub fn apply(&mut self, event: &SyncEvent, enveloped: bool) -> Option<SnapshotCategory> {
        let category = event.event_type.snapshot_category()?;
        let value = match event.payload.get(category.payload_key()) {
            Some(inner) if enveloped => inner.clone(),
            _ => event.payload.clone(),
        };

        self.slot_bytes[slot_index(category)] = serde_json::to_vec(&value)
            .map(|bytes| bytes.len())
            .unwrap_or(0);
        *self.current.slot_mut(category) = Some(value);
        self.current.last_updated = Some(event.created_at);
        self.observed = true;
        Some(category)
    }

    /// `None` until at least one category has been observed.
    pub fn current(&self) -> Option<DataSnapshot> {
        self.observed.then(|| self.current.clone())
    }

    pub fn estimated_bytes(&self) -> usize {
        self.slot_bytes.iter().sum()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn slot_index(category: SnapshotCategory) -> usize {
    match category {
        SnapshotCategory::AnalyticsData => 0,
        SnapshotCategory::Settings => 1,
        SnapshotCategory::Filters => 2,
        SnapshotCategory::SystemMetrics => 3,
    }
}
