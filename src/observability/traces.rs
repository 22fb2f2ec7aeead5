//! Trace pipeline: span exporter, batch processor, tracer provider.

use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tonic::transport::Channel;

use super::error::InitError;
use super::exporters::ExporterFactory;
use super::Signal;

/// Settings for the trace pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    /// Delay between two consecutive batch exports.
    pub scheduled_delay: Duration,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            scheduled_delay: Duration::from_secs(5),
        }
    }
}

/// Build the tracer provider.
///
/// Every span is sampled. Finished spans are buffered by a batch processor and
/// exported off the calling thread.
pub fn init_tracer_provider<F: ExporterFactory>(
    factory: &F,
    channel: &Channel,
    resource: &Resource,
    settings: &TraceSettings,
) -> Result<SdkTracerProvider, InitError> {
    let exporter = factory
        .span_exporter(channel)
        .map_err(|source| InitError::Exporter {
            signal: Signal::Traces,
            source,
        })?;

    let batch_config = BatchConfigBuilder::default()
        .with_scheduled_delay(settings.scheduled_delay)
        .build();
    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource.clone())
        .with_span_processor(processor)
        .build();

    tracing::debug!(
        scheduled_delay = ?settings.scheduled_delay,
        "Trace pipeline initialized"
    );
    Ok(provider)
}
