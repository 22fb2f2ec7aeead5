//! Exporter construction over the shared channel.
//!
//! [`ExporterFactory`] is the seam between the lifecycle and the wire: the
//! binary uses [`OtlpExporters`], tests plug in in-memory exporters.

use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use std::time::Duration;
use tonic::transport::Channel;

/// Boxed error returned by exporter construction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the span and metric exporters for the two pipelines.
pub trait ExporterFactory {
    type SpanExporter: opentelemetry_sdk::trace::SpanExporter + 'static;
    type MetricExporter: PushMetricExporter;

    /// Build the span exporter sending through `channel`.
    fn span_exporter(&self, channel: &Channel) -> Result<Self::SpanExporter, BoxError>;

    /// Build the metric exporter sending through `channel`.
    fn metric_exporter(&self, channel: &Channel) -> Result<Self::MetricExporter, BoxError>;
}

/// OTLP/gRPC exporters.
#[derive(Debug, Clone)]
pub struct OtlpExporters {
    /// Deadline for each export call.
    pub export_timeout: Duration,
}

impl Default for OtlpExporters {
    fn default() -> Self {
        Self {
            export_timeout: Duration::from_secs(10),
        }
    }
}

impl ExporterFactory for OtlpExporters {
    type SpanExporter = SpanExporter;
    type MetricExporter = MetricExporter;

    fn span_exporter(&self, channel: &Channel) -> Result<SpanExporter, BoxError> {
        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_channel(channel.clone())
            .with_timeout(self.export_timeout)
            .build()?;
        Ok(exporter)
    }

    fn metric_exporter(&self, channel: &Channel) -> Result<MetricExporter, BoxError> {
        let exporter = MetricExporter::builder()
            .with_tonic()
            .with_channel(channel.clone())
            .with_timeout(self.export_timeout)
            .build()?;
        Ok(exporter)
    }
}
