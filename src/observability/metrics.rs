//! Metric pipeline: metric exporter, periodic reader, meter provider.

use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tonic::transport::Channel;

use super::error::InitError;
use super::exporters::ExporterFactory;
use super::Signal;

/// Settings for the metric pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSettings {
    /// Interval between two collections pushed to the exporter.
    pub export_interval: Duration,
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            export_interval: Duration::from_secs(60),
        }
    }
}

/// Build the meter provider.
///
/// Instruments are collected on a fixed interval by a periodic reader; a final
/// collection happens on flush and shutdown.
pub fn init_meter_provider<F: ExporterFactory>(
    factory: &F,
    channel: &Channel,
    resource: &Resource,
    settings: &MetricSettings,
) -> Result<SdkMeterProvider, InitError> {
    let exporter = factory
        .metric_exporter(channel)
        .map_err(|source| InitError::Exporter {
            signal: Signal::Metrics,
            source,
        })?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(settings.export_interval)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource.clone())
        .build();

    tracing::debug!(
        export_interval = ?settings.export_interval,
        "Metric pipeline initialized"
    );
    Ok(provider)
}
