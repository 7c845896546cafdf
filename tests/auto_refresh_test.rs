// tests/auto_refresh_test.rs
//! Auto-refresh scheduling through the bus, on a paused tokio clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Recorder;
use dashsync::{AutoRefreshConfig, EventBus, EventType, SyncConfig, REFRESH_CHANGE_TYPE};
use pretty_assertions::assert_eq;
use tokio::time::sleep;
use tokio_test::assert_ok;

fn bus_with_refresh_listener() -> (EventBus, Recorder) {
    let bus = EventBus::default();
    let recorder = Recorder::new();
    recorder.register(&bus, "dash", 10, &[EventType::DataGenerated]);
    (bus, recorder)
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_switches_cadence_immediately() {
    let (bus, recorder) = bus_with_refresh_listener();

    assert_ok!(bus.configure_auto_refresh(true, Some(1_000)));
    assert_ok!(bus.configure_auto_refresh(true, Some(5_000)));

    // No tick at the stale 1s cadence.
    sleep(Duration::from_millis(4_999)).await;
    assert_eq!(recorder.count("dash"), 0);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(recorder.count("dash"), 1);

    sleep(Duration::from_millis(5_000)).await;
    assert_eq!(recorder.count("dash"), 2);
    assert_eq!(
        bus.auto_refresh_config(),
        AutoRefreshConfig {
            enabled: true,
            interval_ms: 5_000
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_mid_interval_restarts_from_now() {
    let (bus, recorder) = bus_with_refresh_listener();

    assert_ok!(bus.configure_auto_refresh(true, Some(10_000)));
    sleep(Duration::from_millis(8_000)).await;
    assert_ok!(bus.configure_auto_refresh(true, Some(3_000)));

    // The old timer would have fired at 10s; the new one fires at 11s.
    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(recorder.count("dash"), 0);
    sleep(Duration::from_millis(600)).await;
    assert_eq!(recorder.count("dash"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disable_halts_periodic_events() {
    let (bus, recorder) = bus_with_refresh_listener();

    assert_ok!(bus.configure_auto_refresh(true, Some(1_000)));
    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(recorder.count("dash"), 2);

    assert_ok!(bus.configure_auto_refresh(false, None));
    sleep(Duration::from_millis(10_000)).await;
    assert_eq!(recorder.count("dash"), 2);
    assert!(!bus.auto_refresh_config().enabled);
}

#[tokio::test(start_paused = true)]
async fn test_tick_payload_and_default_interval() {
    let config = SyncConfig {
        default_refresh_interval_ms: 2_000,
        ..SyncConfig::default()
    };
    let bus = assert_ok!(EventBus::new(config));
    let recorder = Recorder::new();
    recorder.register(&bus, "dash", 10, &[EventType::DataGenerated]);

    assert_ok!(bus.configure_auto_refresh(true, None));
    sleep(Duration::from_millis(4_100)).await;

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].payload["changeType"], REFRESH_CHANGE_TYPE);
    assert_eq!(calls[0].payload["data"]["tick"], 1);
    assert_eq!(calls[1].payload["data"]["tick"], 2);
    assert_eq!(bus.get_performance_metrics().total_events, 2);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_timer() {
    let (bus, recorder) = bus_with_refresh_listener();
    let bus = Arc::new(bus);

    assert_ok!(bus.configure_auto_refresh(true, Some(1_000)));
    sleep(Duration::from_millis(1_500)).await;
    bus.dispose();
    sleep(Duration::from_millis(10_000)).await;

    assert_eq!(recorder.count_type(EventType::DataGenerated), 1);
    assert!(!bus.auto_refresh_config().enabled);
    assert_eq!(bus.get_performance_metrics().total_events, 1);
}

#[tokio::test(start_paused = true)]
async fn test_configure_after_dispose_starts_no_timer() {
    let (bus, recorder) = bus_with_refresh_listener();
    bus.dispose();

    assert_ok!(bus.configure_auto_refresh(true, Some(1_000)));
    sleep(Duration::from_millis(5_000)).await;

    assert_eq!(recorder.count("dash"), 0);
    assert!(!bus.auto_refresh_config().enabled);
    assert_eq!(bus.get_performance_metrics().total_events, 0);
}

#[tokio::test]
async fn test_zero_interval_is_a_configuration_error() {
    let bus = EventBus::default();
    assert!(bus.configure_auto_refresh(true, Some(0)).is_err());
    assert!(!bus.auto_refresh_config().enabled);
}
