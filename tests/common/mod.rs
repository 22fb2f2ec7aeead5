//! Test utilities shared by the integration tests.
//!
//! Provides:
//! - An exporter factory backed by in-memory exporters
//! - Helpers to read back recorded spans and counters

#![allow(dead_code)]

use lantern::observability::{BoxError, ExporterFactory, TelemetryConfig};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::InMemoryMetricExporter;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData, SpanExporter};
use opentelemetry_sdk::Resource;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Channel;

/// In-memory span exporter that remembers whether it was shut down.
#[derive(Debug, Clone)]
pub struct RecordingSpanExporter {
    inner: InMemorySpanExporter,
    shut_down: Arc<AtomicBool>,
}

impl SpanExporter for RecordingSpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        self.inner.export(batch)
    }

    fn shutdown_with_timeout(&mut self, timeout: Duration) -> OTelSdkResult {
        self.shut_down.store(true, Ordering::SeqCst);
        self.inner.shutdown_with_timeout(timeout)
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }
}

/// Exporter factory recording everything in memory.
///
/// Counts how often each exporter was requested and can be told to fail.
#[derive(Clone, Default)]
pub struct TestExporters {
    pub spans: InMemorySpanExporter,
    pub metrics: InMemoryMetricExporter,
    pub span_calls: Arc<AtomicUsize>,
    pub spans_shut_down: Arc<AtomicBool>,
    pub metric_calls: Arc<AtomicUsize>,
    pub fail_spans: bool,
    pub fail_metrics: bool,
}

impl TestExporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_spans() -> Self {
        Self {
            fail_spans: true,
            ..Self::default()
        }
    }

    pub fn failing_metrics() -> Self {
        Self {
            fail_metrics: true,
            ..Self::default()
        }
    }

    pub fn span_calls(&self) -> usize {
        self.span_calls.load(Ordering::SeqCst)
    }

    pub fn metric_calls(&self) -> usize {
        self.metric_calls.load(Ordering::SeqCst)
    }

    /// Whether the span exporter handed out has been shut down.
    pub fn spans_shut_down(&self) -> bool {
        self.spans_shut_down.load(Ordering::SeqCst)
    }

    /// Spans exported so far.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .get_finished_spans()
            .expect("failed to read finished spans")
    }

    /// The most recent metrics export.
    pub fn last_metrics(&self) -> Option<ResourceMetrics> {
        self.metrics
            .get_finished_metrics()
            .expect("failed to read finished metrics")
            .pop()
    }
}

impl ExporterFactory for TestExporters {
    type SpanExporter = RecordingSpanExporter;
    type MetricExporter = InMemoryMetricExporter;

    fn span_exporter(&self, _channel: &Channel) -> Result<RecordingSpanExporter, BoxError> {
        self.span_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_spans {
            return Err("span exporter unavailable".into());
        }
        Ok(RecordingSpanExporter {
            inner: self.spans.clone(),
            shut_down: Arc::clone(&self.spans_shut_down),
        })
    }

    fn metric_exporter(&self, _channel: &Channel) -> Result<InMemoryMetricExporter, BoxError> {
        self.metric_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_metrics {
            return Err("metric exporter unavailable".into());
        }
        Ok(self.metrics.clone())
    }
}

/// Telemetry configuration pointing at the default local collector.
pub fn test_config() -> TelemetryConfig {
    let mut config = TelemetryConfig::new("test-service", "localhost:4317");
    config.shutdown_timeout = Duration::from_secs(1);
    config
}

/// Sum and attribute sets of every data point of a u64 counter.
pub fn counter_points(metrics: &ResourceMetrics, name: &str) -> Vec<(u64, Vec<KeyValue>)> {
    let mut points = Vec::new();
    for scope in metrics.scope_metrics() {
        for metric in scope.metrics() {
            if metric.name() != name {
                continue;
            }
            if let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() {
                for point in sum.data_points() {
                    points.push((point.value(), point.attributes().cloned().collect()));
                }
            }
        }
    }
    points
}
