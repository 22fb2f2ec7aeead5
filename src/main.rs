//! Lantern: emits traces and metrics to an OpenTelemetry collector.
//!
//! # Usage
//!
//! ```bash
//! lantern --target localhost:4317 --service-name test-service --iterations 10
//! ```
//!
//! Environment variables can also be used:
//! - `LANTERN_COLLECTOR_TARGET`: Collector address
//! - `OTEL_SERVICE_NAME`: Service name
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use lantern::config::Config;
use lantern::observability;
use lantern::observability::tracing::init_tracing;
use lantern::workload::run_workload;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Lantern v{} - OpenTelemetry pipeline demo

  Configuration:
    Collector:   {}
    Service:     {}
    Iterations:  {} x {}ms
    Log Level:   {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.target,
        config.service_name,
        config.iterations,
        config.iteration_delay_ms,
        config.log_level
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize console logging
    init_tracing(&config.log_level, config.log_format);

    // Print startup banner
    print_banner(&config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tracing::info!("Waiting for connection...");
    let telemetry = observability::init(&config.telemetry())
        .context("failed to initialize telemetry")?;

    run_workload(&telemetry, &config.workload(), shutdown_rx).await;

    // Flushing blocks on the exporters, keep it off the async workers
    let timeout = config.shutdown_timeout();
    let result = tokio::task::spawn_blocking(move || telemetry.shutdown(timeout))
        .await
        .context("telemetry shutdown task panicked")?;
    if let Err(err) = &result {
        tracing::error!(error = %err, "Failed to shutdown telemetry");
    }
    result.context("failed to shutdown telemetry")?;

    tracing::info!("Lantern shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
            return;
        }
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}
