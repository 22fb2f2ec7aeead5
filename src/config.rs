//! Configuration parsing for Lantern.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults that point at a local collector

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::observability::{MetricSettings, TelemetryConfig, TraceSettings};
use crate::workload::WorkloadSettings;

/// Output format of the console log.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Lantern: emits traces and metrics to an OpenTelemetry collector.
#[derive(Parser, Debug, Clone)]
#[command(name = "lantern")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Service name attached to every span and metric
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "test-service")]
    pub service_name: String,

    /// Collector address (host:port or http://host:port)
    #[arg(long, env = "LANTERN_COLLECTOR_TARGET", default_value = "localhost:4317")]
    pub target: String,

    /// Extra resource attribute as key=value (repeatable)
    #[arg(long = "resource-attr", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub resource_attributes: Vec<(String, String)>,

    /// Interval between metric exports, in seconds
    #[arg(long, env = "LANTERN_EXPORT_INTERVAL_SECS", default_value_t = 60)]
    pub export_interval_secs: u64,

    /// Delay between span batch exports, in milliseconds
    #[arg(long, env = "LANTERN_BATCH_DELAY_MS", default_value_t = 5000)]
    pub batch_delay_ms: u64,

    /// Upper bound on flushing each pipeline at shutdown, in seconds
    #[arg(long, env = "LANTERN_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Number of workload iterations
    #[arg(long, env = "LANTERN_ITERATIONS", default_value_t = 10)]
    pub iterations: u32,

    /// Wait per workload iteration, in milliseconds
    #[arg(long, env = "LANTERN_ITERATION_DELAY_MS", default_value_t = 1000)]
    pub iteration_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Console log format
    #[arg(long, env = "LANTERN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Telemetry settings derived from this configuration.
    ///
    /// The binary installs the providers as process-wide defaults so that
    /// libraries using the global API are exported too.
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            target: self.target.clone(),
            resource_attributes: self.resource_attributes.clone(),
            traces: TraceSettings {
                scheduled_delay: Duration::from_millis(self.batch_delay_ms),
            },
            metrics: MetricSettings {
                export_interval: Duration::from_secs(self.export_interval_secs),
            },
            shutdown_timeout: self.shutdown_timeout(),
            install_global: true,
        }
    }

    /// Workload settings derived from this configuration.
    pub fn workload(&self) -> WorkloadSettings {
        WorkloadSettings {
            iterations: self.iterations,
            delay: Duration::from_millis(self.iteration_delay_ms),
        }
    }

    /// Shutdown timeout as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "test-service".into(),
            target: "localhost:4317".into(),
            resource_attributes: Vec::new(),
            export_interval_secs: 60,
            batch_delay_ms: 5000,
            shutdown_timeout_secs: 5,
            iterations: 10,
            iteration_delay_ms: 1000,
            log_level: "info".into(),
            log_format: LogFormat::Text,
        }
    }
}

/// Parse a `key=value` pair. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
