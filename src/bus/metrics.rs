//! Live counters and running statistics for the bus.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Gauge weight of each registered listener, in percentage points.
const LISTENER_MEMORY_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPerformanceMetrics {
    /// Dispatched events, one per emission (not per listener).
    pub total_events: u64,
    /// Registered components, active or not.
    pub total_listeners: usize,
    /// Running mean of whole-dispatch wall-clock time.
    pub average_processing_time_ms: f64,
    /// Caught listener failures.
    pub errors_count: u64,
    /// Active registered components.
    pub components_listening: usize,
    /// Heuristic gauge in [0, 100].
    pub memory_usage: f64,
    /// Dispatches per second over the trailing window.
    pub data_refresh_rate: f64,
    /// Emissions rejected because the pending queue was full.
    pub dropped_events: u64,
}

pub(crate) struct PerformanceMonitor {
    total_events: u64,
    errors_count: u64,
    dropped_events: u64,
    average_processing_time_ms: f64,
    window: Duration,
    recent: VecDeque<Instant>,
    memory_budget_bytes: usize,
}

impl PerformanceMonitor {
    pub fn new(window: Duration, memory_budget_bytes: usize) -> Self {
        Self {
            total_events: 0,
            errors_count: 0,
            dropped_events: 0,
            average_processing_time_ms: 0.0,
            window,
            recent: VecDeque::new(),
            memory_budget_bytes: memory_budget_bytes.max(1),
        }
    }

    /// Fold one completed dispatch into the counters.
    pub fn record_dispatch(&mut self, finished_at: Instant, elapsed: Duration) {
        self.total_events += 1;
        let sample = elapsed.as_secs_f64() * 1000.0;
        self.average_processing_time_ms +=
            (sample - self.average_processing_time_ms) / self.total_events as f64;

        self.recent.push_back(finished_at);
        self.prune(finished_at);
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }

    pub fn record_drop(&mut self) {
        self.dropped_events += 1;
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn report(
        &self,
        now: Instant,
        total_listeners: usize,
        active_listeners: usize,
        snapshot_bytes: usize,
    ) -> SyncPerformanceMetrics {
        SyncPerformanceMetrics {
            total_events: self.total_events,
            total_listeners,
            average_processing_time_ms: self.average_processing_time_ms,
            errors_count: self.errors_count,
            components_listening: active_listeners,
            memory_usage: estimate_memory_usage(
                snapshot_bytes,
                total_listeners,
                self.memory_budget_bytes,
            ),
            data_refresh_rate: self.refresh_rate(now),
            dropped_events: self.dropped_events,
        }
    }

    fn refresh_rate(&self, now: Instant) -> f64 {
        let in_window = self
            .recent
            .iter()
            .filter(|at| now.saturating_duration_since(**at) <= self.window)
            .count();
        in_window as f64 / self.window.as_secs_f64().max(f64::EPSILON)
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.recent.front() {
            if now.saturating_duration_since(*oldest) > self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }
}

fn estimate_memory_usage(snapshot_bytes: usize, listeners: usize, budget_bytes: usize) -> f64 {
    let snapshot_share = snapshot_bytes as f64 / budget_bytes as f64 * 100.0;
    let listener_share = listeners as f64 * LISTENER_MEMORY_WEIGHT;
    (snapshot_share + listener_share).clamp(0.0, 100.0)
}
