//! Gateway monitor entry point
//!
//! Run with:
//! ```bash
//! DISCORD_BOT_TOKEN=... cargo run -p monitor-gateway
//! ```
//!
//! Configuration is loaded from environment variables and an optional `.env` file.

use anyhow::Context;
use monitor_common::{
    try_init_tracing, try_init_tracing_with_config, AppConfig, AppError, TracingConfig,
    TracingError,
};
use monitor_gateway::{EventSummary, GatewayMonitor, Notification, SessionConfig};
use std::time::Duration;
use tracing::{error, info, warn};

/// How often the main loop checks that the session is still running
const LIVENESS_CHECK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn_tracing(try_init_tracing());
            let e = AppError::from(e);
            error!(code = e.error_code(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    warn_tracing(try_init_tracing_with_config(TracingConfig::for_environment(
        config.app.env,
    )));

    run(config).await
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        url = %config.gateway.url,
        intents = config.gateway.intents,
        resume = config.gateway.resume,
        "Configuration loaded"
    );

    let tag = config.app.monitor_tag.clone();
    let (monitor, mut notifications) = GatewayMonitor::new(SessionConfig::from(&config));
    monitor.start_monitoring(&tag);

    let mut liveness = tokio::time::interval(LIVENESS_CHECK);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
                info!("Shutdown signal received");
                break;
            }
            notification = notifications.recv() => match notification {
                Some(notification) => report(&notification),
                None => break,
            },
            _ = liveness.tick() => {
                if !monitor.is_monitoring() {
                    warn!(tag = %tag, "Session ended on its own");
                    break;
                }
            }
        }
    }

    if let Some(stats) = monitor.queue_stats() {
        info!(
            depth = stats.depth,
            total_enqueued = stats.total_enqueued,
            high_water_mark = stats.high_water_mark,
            "Queue statistics"
        );
    }
    monitor.stop_monitoring(&tag).await;
    while let Ok(notification) = notifications.try_recv() {
        report(&notification);
    }

    info!("Gateway monitor shut down");
    Ok(())
}

// A second subscriber is not fatal
fn warn_tracing(result: Result<(), TracingError>) {
    if let Err(e) = result.map_err(AppError::from) {
        eprintln!("Warning: {e} ({})", e.error_code());
    }
}

// Status and error notifications are already logged where they are emitted
fn report(notification: &Notification) {
    if let Notification::Event(event) = notification {
        let summary = EventSummary::from_payload(&event.event_type, &event.payload);
        info!(
            enqueued_at = %event.enqueued_at,
            "{}",
            summary.to_lines().join(" | ")
        );
    }
}
