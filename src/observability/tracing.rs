//! Console logging setup.
//!
//! Configures structured logging with:
//! - Environment-based filter (via RUST_LOG or `--log-level`)
//! - Text or JSON output
//!
//! The OpenTelemetry SDK reports its own diagnostics through `tracing`, so
//! export failures show up here too.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Default directives when the configured level cannot be parsed.
const FALLBACK_FILTER: &str = "info";

/// Initialize console logging.
///
/// # Arguments
///
/// * `log_level` - Filter directives, e.g. `info` or `info,lantern=debug`
/// * `format` - Output format
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }

    tracing::info!(level = log_level, ?format, "Logging initialized");
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
