//! End-to-end tests for the sample workload.
//!
//! Tests:
//! - Ten iterations record ten counter increments and eleven spans
//! - A run cancelled before it starts still closes its root span
//! - Cancellation during the wait stops the run early

mod common;

use common::{counter_points, test_config, TestExporters};
use lantern::init_with;
use lantern::observability::tracing::init_test_tracing;
use lantern::workload::{
    common_attributes, run_workload, WorkloadReport, WorkloadSettings, ROOT_SPAN_NAME,
    RUN_COUNTER_NAME,
};
use opentelemetry::trace::SpanId;
use opentelemetry::{Key, Value};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test]
async fn test_ten_iterations_record_counter_and_spans() {
    init_test_tracing();
    let exporters = TestExporters::new();
    let telemetry = init_with(&test_config(), &exporters).unwrap();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let settings = WorkloadSettings {
        iterations: 10,
        delay: Duration::from_millis(5),
    };
    let report = run_workload(&telemetry, &settings, shutdown_rx).await;
    assert_eq!(
        report,
        WorkloadReport {
            iterations: 10,
            cancelled: false
        }
    );

    telemetry.force_flush().unwrap();

    // 1 root + 10 children, all in one trace under the root
    let spans = exporters.finished_spans();
    assert_eq!(spans.len(), 11);

    let root = spans
        .iter()
        .find(|s| s.name == ROOT_SPAN_NAME)
        .expect("root span");
    assert_eq!(root.parent_span_id, SpanId::INVALID);
    assert_eq!(root.attributes.len(), 3);

    let children: Vec<_> = spans.iter().filter(|s| s.name != ROOT_SPAN_NAME).collect();
    assert_eq!(children.len(), 10);
    for child in &children {
        assert!(child.name.starts_with("Sample-"), "{}", child.name);
        assert_eq!(child.parent_span_id, root.span_context.span_id());
        assert_eq!(child.span_context.trace_id(), root.span_context.trace_id());
    }

    // One data point: 10 increments with the 3 static attributes
    let metrics = exporters.last_metrics().expect("metrics exported");
    let points = counter_points(&metrics, RUN_COUNTER_NAME);
    assert_eq!(points.len(), 1);
    let (value, mut attrs) = points.into_iter().next().unwrap();
    assert_eq!(value, 10);
    attrs.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
    assert_eq!(attrs, common_attributes().to_vec());

    // Both pipelines carry the same service identity
    assert_eq!(
        metrics.resource().get(&Key::new("service.name")),
        Some(Value::from("test-service"))
    );
    assert_eq!(
        telemetry.resource().get(&Key::new("service.name")),
        Some(Value::from("test-service"))
    );

    telemetry.shutdown(Duration::from_secs(1)).unwrap();
}

#[tokio::test]
async fn test_cancelled_before_start_emits_only_root_span() {
    let exporters = TestExporters::new();
    let telemetry = init_with(&test_config(), &exporters).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let report = run_workload(&telemetry, &WorkloadSettings::default(), shutdown_rx).await;
    assert_eq!(report.iterations, 0);
    assert!(report.cancelled);

    telemetry.force_flush().unwrap();
    let spans = exporters.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, ROOT_SPAN_NAME);

    let counted: u64 = exporters
        .last_metrics()
        .map(|m| counter_points(&m, RUN_COUNTER_NAME).iter().map(|(v, _)| v).sum())
        .unwrap_or(0);
    assert_eq!(counted, 0);

    telemetry.shutdown(Duration::from_secs(1)).unwrap();
}

#[tokio::test]
async fn test_shutdown_signal_interrupts_wait() {
    let exporters = TestExporters::new();
    let telemetry = init_with(&test_config(), &exporters).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let settings = WorkloadSettings {
        iterations: 10,
        delay: Duration::from_secs(30),
    };

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = shutdown_tx.send(true);
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        run_workload(&telemetry, &settings, shutdown_rx),
    )
    .await
    .expect("workload should stop on shutdown");

    assert_eq!(report.iterations, 1);
    assert!(report.cancelled);

    telemetry.force_flush().unwrap();
    // The interrupted child and the root are both ended
    assert_eq!(exporters.finished_spans().len(), 2);

    telemetry.shutdown(Duration::from_secs(1)).unwrap();
}
