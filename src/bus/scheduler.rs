//! Periodic auto-refresh.
//!
//! A single tokio task per scheduler ticks at the configured interval and
//! hands each tick to a [`RefreshSink`]. Reconfiguring aborts the running
//! task and starts a new one under the same lock, so two timers never
//! coexist and a new interval takes effect immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::SyncError;

/// `change_type` carried by refresh-tick events.
pub const REFRESH_CHANGE_TYPE: &str = "periodic_refresh";

/// `source` of refresh-tick events.
pub const REFRESH_SOURCE: &str = "auto_refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRefreshConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

/// Receiver of refresh ticks. `tick` counts from 1 for each timer.
pub trait RefreshSink: Send + Sync + 'static {
    fn on_refresh_tick(&self, tick: u64);
}

struct SchedulerState {
    config: AutoRefreshConfig,
    task: Option<JoinHandle<()>>,
    closed: bool,
}

pub struct AutoRefreshScheduler {
    default_interval_ms: u64,
    state: Mutex<SchedulerState>,
    generation: Arc<AtomicU64>,
}

impl AutoRefreshScheduler {
    pub fn new(default_interval_ms: u64) -> Self {
        Self {
            default_interval_ms,
            state: Mutex::new(SchedulerState {
                config: AutoRefreshConfig {
                    enabled: false,
                    interval_ms: default_interval_ms,
                },
                task: None,
                closed: false,
            }),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start, restart or stop the refresh timer.
    ///
    /// Enabling requires a tokio runtime on the calling thread. The first
    /// tick lands one full interval after this call.
    pub fn configure(
        &self,
        sink: Weak<dyn RefreshSink>,
        enabled: bool,
        interval_ms: Option<u64>,
    ) -> Result<(), SyncError> {
        if !enabled {
            self.stop();
            return Ok(());
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            tracing::warn!("auto-refresh on closed scheduler ignored");
            return Ok(());
        }
        let interval_ms = interval_ms.unwrap_or(self.default_interval_ms);
        if interval_ms == 0 {
            return Err(SyncError::Configuration(
                "auto-refresh interval must be greater than zero".into(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SyncError::Configuration("auto-refresh requires a running tokio runtime".into())
        })?;

        let period = Duration::from_millis(interval_ms);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = state.task.take() {
            previous.abort();
        }
        let first_tick = Instant::now() + period;
        state.task = Some(runtime.spawn(run_refresh_loop(
            sink,
            first_tick,
            period,
            generation,
            self.generation.clone(),
        )));
        state.config = AutoRefreshConfig {
            enabled: true,
            interval_ms,
        };
        tracing::debug!(interval_ms, generation, "auto-refresh timer started");
        Ok(())
    }

    /// Cancel the timer, if any. The last interval is remembered.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = state.task.take() {
            task.abort();
            tracing::debug!("auto-refresh timer stopped");
        }
        state.config.enabled = false;
    }

    /// Stop the timer for good. Later `configure` calls are ignored.
    pub fn close(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
        self.stop();
    }

    pub fn config(&self) -> AutoRefreshConfig {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .config
    }
}

impl Drop for AutoRefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_refresh_loop(
    sink: Weak<dyn RefreshSink>,
    first_tick: Instant,
    period: Duration,
    generation: u64,
    current: Arc<AtomicU64>,
) {
    let mut interval = time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick = 0u64;

    loop {
        interval.tick().await;
        // Superseded between the wake-up and now.
        if current.load(Ordering::SeqCst) != generation {
            break;
        }
        let Some(sink) = sink.upgrade() else {
            break;
        };
        tick += 1;
        tracing::trace!(tick, "auto-refresh tick");
        sink.on_refresh_tick(tick);
    }
}
