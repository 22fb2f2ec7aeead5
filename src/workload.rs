//! Sample workload that exercises both pipelines.
//!
//! One root span covers the run; each iteration adds a child span and one
//! increment of the `run` counter, then waits.

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::trace::{Span, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use std::time::Duration;
use tokio::sync::watch;

use crate::observability::Telemetry;

/// Name of the span covering the whole run.
pub const ROOT_SPAN_NAME: &str = "CollectorExporter-Example";

/// Name of the per-iteration counter.
pub const RUN_COUNTER_NAME: &str = "run";

/// Settings for [`run_workload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSettings {
    pub iterations: u32,
    /// Wait inside each iteration.
    pub delay: Duration,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            iterations: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of a workload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkloadReport {
    /// Iterations started, including one cut short by shutdown.
    pub iterations: u32,
    /// Whether shutdown stopped the run early.
    pub cancelled: bool,
}

/// Attributes attached to the root span and to every counter increment.
pub fn common_attributes() -> [KeyValue; 3] {
    [
        KeyValue::new("attrA", "chocolate"),
        KeyValue::new("attrB", "raspberry"),
        KeyValue::new("attrC", "vanilla"),
    ]
}

/// Instruments recorded by the workload.
#[derive(Debug)]
struct WorkloadMetrics {
    /// Number of iterations run.
    run_count: Counter<u64>,
}

impl WorkloadMetrics {
    fn new(meter: &Meter) -> Self {
        Self {
            run_count: meter
                .u64_counter(RUN_COUNTER_NAME)
                .with_description("The number of times the iteration ran")
                .build(),
        }
    }
}

/// Run the workload until all iterations are done or shutdown is requested.
///
/// Spans still open when shutdown arrives are ended before returning.
pub async fn run_workload(
    telemetry: &Telemetry,
    settings: &WorkloadSettings,
    mut shutdown_rx: watch::Receiver<bool>,
) -> WorkloadReport {
    let tracer = telemetry.tracer(crate::INSTRUMENTATION_NAME);
    let metrics = WorkloadMetrics::new(&telemetry.meter(crate::INSTRUMENTATION_NAME));
    let attrs = common_attributes();

    let root = tracer
        .span_builder(ROOT_SPAN_NAME)
        .with_attributes(attrs.to_vec())
        .start(&tracer);
    let cx = Context::current_with_span(root);

    let mut report = WorkloadReport::default();
    for i in 0..settings.iterations {
        if *shutdown_rx.borrow() {
            report.cancelled = true;
            break;
        }

        let mut span = tracer.start_with_context(format!("Sample-{i}"), &cx);
        metrics.run_count.add(1, &attrs);
        report.iterations += 1;
        tracing::info!(
            iteration = i + 1,
            total = settings.iterations,
            "Doing really hard work ({} / {})",
            i + 1,
            settings.iterations
        );

        let interrupted = tokio::select! {
            () = tokio::time::sleep(settings.delay) => false,
            () = shutdown_requested(&mut shutdown_rx) => true,
        };
        span.end();

        if interrupted {
            tracing::info!(iteration = i + 1, "Shutdown requested, stopping workload");
            report.cancelled = true;
            break;
        }
    }

    cx.span().end();
    tracing::info!(
        iterations = report.iterations,
        cancelled = report.cancelled,
        "Done!"
    );
    report
}

/// Resolves once shutdown is requested. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let closed = shutdown_rx.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
