//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - A shared gRPC connection to the collector
//! - The resource describing this service
//! - Trace and metric pipelines exporting over OTLP
//! - Coordinated initialization, rollback and shutdown
//! - Console logging for the process itself

pub mod connection;
pub mod error;
pub mod exporters;
pub mod lifecycle;
pub mod metrics;
pub mod resource;
pub mod traces;
pub mod tracing;

use std::fmt;

pub use error::{ConnectionError, InitError, ResourceError, ShutdownError};
pub use exporters::{BoxError, ExporterFactory, OtlpExporters};
pub use lifecycle::{init, init_with, ShutdownHandle, Telemetry, TelemetryConfig};
pub use metrics::MetricSettings;
pub use traces::TraceSettings;

/// A telemetry pipeline kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Traces,
    Metrics,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Traces => f.write_str("traces"),
            Self::Metrics => f.write_str("metrics"),
        }
    }
}
