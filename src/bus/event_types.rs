//! Event types, priorities and the fixed type→priority policy.
//!
//! Single source of truth for which priority each event type is emitted
//! with by default and which snapshot category (if any) an event type
//! refreshes.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Closed set of events exchanged between dashboard components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    DataGenerated,
    SettingsChanged,
    AnalyticsUpdated,
    SystemMetricsUpdated,
    ChartInteraction,
    FilterApplied,
    PersonaChanged,
    ErrorOccurred,
    PerformanceWarning,
}

impl EventType {
    pub const ALL: [EventType; 9] = [
        EventType::DataGenerated,
        EventType::SettingsChanged,
        EventType::AnalyticsUpdated,
        EventType::SystemMetricsUpdated,
        EventType::ChartInteraction,
        EventType::FilterApplied,
        EventType::PersonaChanged,
        EventType::ErrorOccurred,
        EventType::PerformanceWarning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DataGenerated => "DATA_GENERATED",
            EventType::SettingsChanged => "SETTINGS_CHANGED",
            EventType::AnalyticsUpdated => "ANALYTICS_UPDATED",
            EventType::SystemMetricsUpdated => "SYSTEM_METRICS_UPDATED",
            EventType::ChartInteraction => "CHART_INTERACTION",
            EventType::FilterApplied => "FILTER_APPLIED",
            EventType::PersonaChanged => "PERSONA_CHANGED",
            EventType::ErrorOccurred => "ERROR_OCCURRED",
            EventType::PerformanceWarning => "PERFORMANCE_WARNING",
        }
    }

    /// Priority an event of this type is emitted with when the caller
    /// does not pick one.
    pub fn default_priority(&self) -> Priority {
        match self {
            EventType::SettingsChanged => Priority::High,
            EventType::AnalyticsUpdated => Priority::Medium,
            EventType::ChartInteraction => Priority::Medium,
            EventType::FilterApplied => Priority::Medium,
            EventType::DataGenerated => Priority::Low,
            EventType::PersonaChanged => Priority::Medium,
            EventType::ErrorOccurred => Priority::Critical,
            EventType::SystemMetricsUpdated => Priority::Low,
            EventType::PerformanceWarning => Priority::High,
        }
    }

    /// Snapshot slot refreshed by events of this type.
    pub fn snapshot_category(&self) -> Option<SnapshotCategory> {
        match self {
            EventType::SettingsChanged => Some(SnapshotCategory::Settings),
            EventType::AnalyticsUpdated => Some(SnapshotCategory::AnalyticsData),
            EventType::FilterApplied => Some(SnapshotCategory::Filters),
            EventType::SystemMetricsUpdated => Some(SnapshotCategory::SystemMetrics),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priorities
// ---------------------------------------------------------------------------

/// Delivery weight of an event. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

// ---------------------------------------------------------------------------
// Snapshot categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotCategory {
    AnalyticsData,
    Settings,
    Filters,
    SystemMetrics,
}

impl SnapshotCategory {
    /// Field name the typed helpers use for this category inside an event
    /// payload envelope.
    pub fn payload_key(&self) -> &'static str {
        match self {
            SnapshotCategory::AnalyticsData => "analyticsData",
            SnapshotCategory::Settings => "settings",
            SnapshotCategory::Filters => "filters",
            SnapshotCategory::SystemMetrics => "systemMetrics",
        }
    }
}

// ---------------------------------------------------------------------------
// Component kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Dashboard,
    Chart,
    Table,
    Filter,
    Settings,
    Analytics,
    Report,
    Persona,
    Monitor,
}
