//! Typed emission helpers.
//!
//! Each helper wraps its data in the payload envelope consumers expect and
//! emits with the type's policy priority (see `event_types.rs`).

use serde_json::{json, Value};

use super::event_bus::{EmitRequest, EventBus};
use super::event_types::EventType;
use super::scheduler::REFRESH_CHANGE_TYPE;

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

pub(crate) fn data_change_request(source: &str, change_type: &str, data: Option<Value>) -> EmitRequest {
    EmitRequest::new(
        EventType::DataGenerated,
        source,
        json!({
            "changeType": change_type,
            "data": data.unwrap_or(Value::Null),
        }),
    )
}

pub(crate) fn periodic_refresh_request(source: &str, tick: u64) -> EmitRequest {
    data_change_request(source, REFRESH_CHANGE_TYPE, Some(json!({ "tick": tick })))
}

pub(crate) fn error_occurred_request(
    source: &str,
    message: impl Into<String>,
    details: Option<Value>,
) -> EmitRequest {
    EmitRequest::new(
        EventType::ErrorOccurred,
        source,
        json!({
            "message": message.into(),
            "details": details.unwrap_or(Value::Null),
        }),
    )
}

pub(crate) fn performance_warning_request(source: &str, details: Value) -> EmitRequest {
    EmitRequest::new(EventType::PerformanceWarning, source, details)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl EventBus {
    /// `DATA_GENERATED` (low): a generator produced or refreshed data.
    pub fn emit_data_change(&self, source: &str, change_type: &str, data: Option<Value>) -> String {
        self.emit_event(data_change_request(source, change_type, data))
    }

    /// `SETTINGS_CHANGED` (high). Refreshes the `settings` snapshot slot.
    pub fn emit_settings_change(&self, source: &str, settings: Value, profile: Option<Value>) -> String {
        let request = EmitRequest::new(
            EventType::SettingsChanged,
            source,
            json!({
                "settings": settings,
                "profile": profile.unwrap_or(Value::Null),
            }),
        )
        .enveloped();
        self.emit_event(request)
    }

    /// `ANALYTICS_UPDATED` (medium). Refreshes the `analytics_data` slot.
    pub fn emit_analytics_update(
        &self,
        source: &str,
        analytics_data: Value,
        filters: Option<Value>,
    ) -> String {
        let request = EmitRequest::new(
            EventType::AnalyticsUpdated,
            source,
            json!({
                "analyticsData": analytics_data,
                "filters": filters.unwrap_or(Value::Null),
            }),
        )
        .enveloped();
        self.emit_event(request)
    }

    /// `CHART_INTERACTION` (medium). The interaction data is the payload.
    pub fn emit_chart_interaction(&self, source: &str, interaction_data: Value) -> String {
        self.emit_event(EmitRequest::new(
            EventType::ChartInteraction,
            source,
            interaction_data,
        ))
    }

    /// `FILTER_APPLIED` (medium). Refreshes the `filters` slot; the latest
    /// emission wins, including an empty "clear all" filter set.
    pub fn emit_filter_applied(&self, source: &str, filters: Value) -> String {
        let request = EmitRequest::new(
            EventType::FilterApplied,
            source,
            json!({ "filters": filters }),
        )
        .enveloped();
        self.emit_event(request)
    }

    pub fn emit_persona_changed(&self, source: &str, persona: Value) -> String {
        self.emit_event(EmitRequest::new(
            EventType::PersonaChanged,
            source,
            json!({ "persona": persona }),
        ))
    }

    /// `SYSTEM_METRICS_UPDATED` (low). Refreshes the `system_metrics` slot.
    pub fn emit_system_metrics(&self, source: &str, metrics: Value) -> String {
        let request = EmitRequest::new(
            EventType::SystemMetricsUpdated,
            source,
            json!({ "systemMetrics": metrics }),
        )
        .enveloped();
        self.emit_event(request)
    }

    pub fn emit_error_occurred(&self, source: &str, message: &str, details: Option<Value>) -> String {
        self.emit_event(error_occurred_request(source, message, details))
    }

    pub fn emit_performance_warning(&self, source: &str, details: Value) -> String {
        self.emit_event(performance_warning_request(source, details))
    }
}
