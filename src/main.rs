//! Access panel - occupancy-limited entry control
//!
//! Counts occupants between 0 and a configured maximum. Entry and exit
//! buttons adjust the count, a reset button drains it, and every change is
//! mirrored to the display, RGB indicator and buzzer.
//!
//! Module structure:
//! - `domain/` - Core types (Source, StatusLabel, ColorTier, PanelView)
//! - `io/` - External interfaces (console input, feedback sinks)
//! - `services/` - Synchronization core (debounce, channels, counter, tasks)
//! - `infra/` - Infrastructure (Config, Clock, Metrics)

use access_panel::infra::{Config, Metrics, MonotonicClock};
use access_panel::io::{run_console_input, LogSink};
use access_panel::services::{build_panel, spawn_access_tasks};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Access panel - occupancy counter driven by entry/exit/reset buttons
#[derive(Parser, Debug)]
#[command(name = "access-panel", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/panel.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    // Default: INFO, use RUST_LOG=debug for render and ignored-exit events
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(git_hash = env!("GIT_HASH"), "access-panel starting");

    let config_path = Config::resolve_config_path(args.config);
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        max_occupants = %config.max_occupants(),
        reset_cooldown_ms = %config.reset_cooldown_ms(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let (core, dispatcher) = build_panel(
        config.clone(),
        Box::new(LogSink),
        Arc::new(MonotonicClock::new()),
        metrics.clone(),
    );

    let _tasks = spawn_access_tasks(core.clone());

    // Periodic metrics summary
    let metrics_core = core.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            metrics.report(metrics_core.snapshot()).log();
        }
    });

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Button input thread stands in for the GPIO edge interrupt
    let console_core = core.clone();
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin().lock();
            run_console_input(stdin, dispatcher, console_core, shutdown_tx);
        })
        .context("Failed to spawn console input thread")?;

    info!("panel_ready");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutdown_signal_received"),
        _ = shutdown_rx.changed() => {}
    }

    core.metrics().report(core.snapshot()).log();
    info!("access-panel shutdown complete");
    Ok(())
}
