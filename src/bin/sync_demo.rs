//! Drives the sync engine with synthetic dashboard traffic and prints the
//! resulting metrics.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;

use dashsync::{
    init_tracing, ComponentRegistration, ComponentType, EventBus, EventType, SyncConfig,
};

struct DemoOptions {
    duration_secs: u64,
    refresh_ms: Option<u64>,
    tick_ms: u64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            refresh_ms: Some(1_000),
            tick_ms: 250,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("sync demo failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    init_tracing();
    let Some(options) = parse_args()? else {
        return Ok(());
    };

    let config = SyncConfig::from_env().map_err(|e| e.to_string())?;
    let bus = Arc::new(EventBus::new(config).map_err(|e| e.to_string())?);

    bus.register_component(
        ComponentRegistration::new("dashboard", ComponentType::Dashboard, |event| {
            tracing::info!(event_type = %event.event_type, source = %event.source, "dashboard refresh");
            Ok(())
        })
        .subscribe_all([EventType::DataGenerated, EventType::PersonaChanged])
        .priority(10),
    )
    .map_err(|e| e.to_string())?;

    bus.register_component(
        ComponentRegistration::new("revenue-chart", ComponentType::Chart, |event| {
            if event.event_type == EventType::FilterApplied {
                tracing::debug!(filters = %event.payload["filters"], "chart refilter");
                return Ok(());
            }
            let revenue = event.payload["analyticsData"]["revenue"]
                .as_f64()
                .ok_or("analytics payload without revenue")?;
            tracing::debug!(revenue, "chart redraw");
            Ok(())
        })
        .subscribe_all([EventType::AnalyticsUpdated, EventType::FilterApplied])
        .priority(5),
    )
    .map_err(|e| e.to_string())?;

    let mut store_rx = bus
        .subscribe_channel(
            "state-store",
            ComponentType::Analytics,
            [
                EventType::SettingsChanged,
                EventType::FilterApplied,
                EventType::AnalyticsUpdated,
            ],
            1,
        )
        .map_err(|e| e.to_string())?;
    let store = tokio::spawn(async move {
        let mut applied = 0usize;
        while let Some(event) = store_rx.recv().await {
            applied += 1;
            tracing::debug!(event_type = %event.event_type, applied, "state store applied event");
        }
        applied
    });

    if let Some(refresh_ms) = options.refresh_ms {
        bus.configure_auto_refresh(true, Some(refresh_ms))
            .map_err(|e| e.to_string())?;
    }

    bus.emit_persona_changed("persona-switcher", json!("portfolio_manager"));
    bus.emit_settings_change("settings-panel", json!({ "currency": "USD", "theme": "dark" }), None);

    let ticks = options.duration_secs * 1000 / options.tick_ms.max(1);
    let regions = ["EMEA", "APAC", "AMER"];
    for i in 0..ticks {
        let (revenue, region) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(10_000.0..250_000.0),
                regions[rng.gen_range(0..regions.len())],
            )
        };
        bus.emit_analytics_update(
            "mock-generator",
            json!({ "revenue": revenue, "region": region, "sample": i }),
            None,
        );
        if i % 8 == 7 {
            bus.emit_filter_applied("filter-bar", json!({ "region": region }));
        }
        tokio::time::sleep(Duration::from_millis(options.tick_ms)).await;
    }

    let metrics = bus.get_performance_metrics();
    let snapshot = bus.get_current_data_snapshot();
    bus.dispose();
    drop(bus);
    let applied = store.await.map_err(|e| e.to_string())?;

    println!("\nSync Engine Metrics");
    println!("-------------------");
    println!(
        "{}",
        serde_json::to_string_pretty(&metrics).map_err(|e| e.to_string())?
    );
    println!("\nState store applied {applied} events");
    if let Some(snapshot) = snapshot {
        println!(
            "Last snapshot: {}",
            serde_json::to_string(&snapshot).map_err(|e| e.to_string())?
        );
    }
    Ok(())
}

fn parse_args() -> Result<Option<DemoOptions>, String> {
    let mut options = DemoOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--no-refresh" => options.refresh_ms = None,
            "--duration" => {
                options.duration_secs = parse_u64(args.next(), "--duration")?;
            }
            "--refresh-ms" => {
                options.refresh_ms = Some(parse_u64(args.next(), "--refresh-ms")?);
            }
            "--tick-ms" => {
                options.tick_ms = parse_u64(args.next(), "--tick-ms")?;
            }
            other => return Err(format!("unknown argument '{other}'. Use --help")),
        }
    }
    Ok(Some(options))
}

fn parse_u64(value: Option<String>, flag: &str) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("{flag} requires a value"))?;
    let parsed = value
        .parse::<u64>()
        .map_err(|e| format!("invalid {flag} value '{value}': {e}"))?;
    if parsed == 0 {
        return Err(format!("{flag} must be greater than zero"));
    }
    Ok(parsed)
}

fn print_help() {
    println!("sync_demo [--duration SECS] [--refresh-ms MS | --no-refresh] [--tick-ms MS]");
    println!();
    println!("Registers a dashboard, a chart and a channel-bridged state store,");
    println!("emits synthetic analytics for the given duration and prints metrics.");
}
