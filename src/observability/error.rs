//! Error types for telemetry initialization and shutdown.

use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

use super::exporters::BoxError;
use super::Signal;

/// Error building the channel to the collector.
///
/// These are configuration errors; the channel connects lazily, so an
/// unreachable collector never shows up here.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("collector target is empty")]
    EmptyTarget,

    #[error("unsupported scheme `{0}` in collector target, only plaintext http is available")]
    UnsupportedScheme(String),

    #[error("invalid collector target `{target}`: {source}")]
    InvalidUri {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },
}

/// Error building the resource descriptor.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("resource attribute with value `{0}` has an empty key")]
    EmptyAttributeKey(String),
}

/// Error type for telemetry initialization.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create gRPC connection to collector: {0}")]
    Connection(#[from] ConnectionError),

    #[error("failed to build resource: {0}")]
    Resource(#[from] ResourceError),

    #[error("failed to create {signal} exporter: {source}")]
    Exporter {
        signal: Signal,
        #[source]
        source: BoxError,
    },
}

/// One or more pipelines failed to shut down.
///
/// Failures are kept in the order the pipelines were shut down.
#[derive(Debug, Error)]
#[error("{}", describe_failures(.failures))]
pub struct ShutdownError {
    failures: Vec<(Signal, OTelSdkError)>,
}

impl ShutdownError {
    pub(crate) fn new(failures: Vec<(Signal, OTelSdkError)>) -> Self {
        debug_assert!(!failures.is_empty());
        Self { failures }
    }

    /// The failed pipelines and their causes.
    pub fn failures(&self) -> &[(Signal, OTelSdkError)] {
        &self.failures
    }

    /// Whether the given pipeline is among the failures.
    pub fn failed(&self, signal: Signal) -> bool {
        self.failures.iter().any(|(s, _)| *s == signal)
    }
}

fn describe_failures(failures: &[(Signal, OTelSdkError)]) -> String {
    failures
        .iter()
        .map(|(signal, err)| format!("failed to shut down {signal} pipeline: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
