//! Telemetry lifecycle: ordered initialization, rollback and shutdown.
//!
//! Initialization runs connection -> resource -> traces -> metrics. Each
//! pipeline is recorded on a [`ShutdownHandle`] as soon as it exists, so a
//! failure part way through shuts down exactly what was built, newest first.
//! The same handle later performs the regular shutdown, which therefore
//! closes metrics before traces.

use opentelemetry::global;
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use std::borrow::Cow;
use std::fmt;
use std::thread;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::connection::connect;
use super::error::{InitError, ShutdownError};
use super::exporters::{ExporterFactory, OtlpExporters};
use super::metrics::{init_meter_provider, MetricSettings};
use super::resource::build_resource;
use super::traces::{init_tracer_provider, TraceSettings};
use super::Signal;

type ShutdownAction = Box<dyn FnOnce(Duration) -> OTelSdkResult + Send + Sync>;

/// Ordered shutdown actions of the initialized pipelines.
///
/// Actions run in reverse registration order. All of them run even when an
/// earlier one fails; failures are collected into one [`ShutdownError`].
/// [`shutdown`](Self::shutdown) consumes the handle, so it runs at most once.
#[derive(Default)]
pub struct ShutdownHandle {
    actions: Vec<(Signal, ShutdownAction)>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the shutdown action of a freshly initialized pipeline.
    pub fn push<F>(&mut self, signal: Signal, action: F)
    where
        F: FnOnce(Duration) -> OTelSdkResult + Send + Sync + 'static,
    {
        self.actions.push((signal, Box::new(action)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Pipelines in the order they will be shut down.
    pub fn shutdown_order(&self) -> Vec<Signal> {
        self.actions.iter().rev().map(|(signal, _)| *signal).collect()
    }

    /// Shut every pipeline down, giving each one up to `timeout`.
    pub fn shutdown(self, timeout: Duration) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();

        for (signal, action) in self.actions.into_iter().rev() {
            match action(timeout) {
                Ok(()) => tracing::debug!(%signal, "Pipeline shut down"),
                Err(err) => {
                    tracing::warn!(%signal, error = %err, "Pipeline failed to shut down");
                    failures.push((signal, err));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError::new(failures))
        }
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("shutdown_order", &self.shutdown_order())
            .finish()
    }
}

/// Settings for [`init`] and [`init_with`].
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Value of the `service.name` resource attribute.
    pub service_name: String,
    /// Collector address, `host:port` or `http://host:port`.
    pub target: String,
    /// Extra resource attributes.
    pub resource_attributes: Vec<(String, String)>,
    pub traces: TraceSettings,
    pub metrics: MetricSettings,
    /// Per-pipeline bound for rollback and for shutdown from `Drop`.
    pub shutdown_timeout: Duration,
    /// Also install the providers and the trace-context propagator as
    /// process-wide defaults.
    pub install_global: bool,
}

impl TelemetryConfig {
    /// Configuration with default pipeline settings and no global installation.
    pub fn new(service_name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            target: target.into(),
            resource_attributes: Vec::new(),
            traces: TraceSettings::default(),
            metrics: MetricSettings::default(),
            shutdown_timeout: Duration::from_secs(5),
            install_global: false,
        }
    }
}

/// Initialized telemetry: the providers of both pipelines and their shutdown.
///
/// Dropping a `Telemetry` that was not shut down explicitly shuts it down
/// with the configured timeout and logs any failure.
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    resource: Resource,
    shutdown: Option<ShutdownHandle>,
    shutdown_timeout: Duration,
}

impl Telemetry {
    /// A tracer backed by this context's tracer provider.
    pub fn tracer(&self, name: impl Into<Cow<'static, str>>) -> SdkTracer {
        self.tracer_provider.tracer(name)
    }

    /// A meter backed by this context's meter provider.
    pub fn meter(&self, name: &'static str) -> Meter {
        self.meter_provider.meter(name)
    }

    /// The W3C trace-context propagator for crossing process boundaries.
    pub fn propagator(&self) -> TraceContextPropagator {
        TraceContextPropagator::new()
    }

    /// The resource shared by both pipelines.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn tracer_provider(&self) -> &SdkTracerProvider {
        &self.tracer_provider
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    /// Pipelines in the order [`shutdown`](Self::shutdown) closes them.
    pub fn pipelines(&self) -> Vec<Signal> {
        self.shutdown
            .as_ref()
            .map(ShutdownHandle::shutdown_order)
            .unwrap_or_default()
    }

    /// Export everything buffered so far without shutting down.
    ///
    /// Both pipelines are flushed; the first failure is returned.
    pub fn force_flush(&self) -> OTelSdkResult {
        let metrics = self.meter_provider.force_flush();
        if let Err(err) = &metrics {
            tracing::warn!(signal = %Signal::Metrics, error = %err, "Flush failed");
        }
        let traces = self.tracer_provider.force_flush();
        if let Err(err) = &traces {
            tracing::warn!(signal = %Signal::Traces, error = %err, "Flush failed");
        }
        metrics.and(traces)
    }

    /// Flush and close both pipelines, metrics first.
    ///
    /// Blocks until both are closed or `timeout` elapses for each. The OTLP
    /// exporters send through a channel driven by the Tokio runtime, so async
    /// callers must not block a runtime thread with this: call it through
    /// `tokio::task::spawn_blocking`. On a current-thread runtime an inline call
    /// cannot export anything and waits out the full timeout.
    pub fn shutdown(mut self, timeout: Duration) -> Result<(), ShutdownError> {
        match self.shutdown.take() {
            Some(handle) => handle.shutdown(timeout),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("resource", &self.resource)
            .field("shutdown", &self.shutdown)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl Drop for Telemetry {
    /// Shuts down inline, except on a current-thread runtime where blocking
    /// would starve the exporters. There the shutdown moves to a detached
    /// thread and the drop returns immediately.
    fn drop(&mut self) {
        let Some(handle) = self.shutdown.take() else {
            return;
        };
        tracing::debug!("Telemetry dropped without explicit shutdown");
        let timeout = self.shutdown_timeout;

        if !on_current_thread_runtime() {
            shutdown_logged(handle, timeout);
            return;
        }

        let spawned = thread::Builder::new()
            .name("telemetry-shutdown".into())
            .spawn(move || shutdown_logged(handle, timeout));
        if let Err(err) = spawned {
            tracing::error!(error = %err, "Failed to spawn telemetry shutdown thread");
        }
    }
}

fn shutdown_logged(handle: ShutdownHandle, timeout: Duration) {
    if let Err(err) = handle.shutdown(timeout) {
        tracing::error!(error = %err, "Failed to shutdown telemetry");
    }
}

fn on_current_thread_runtime() -> bool {
    Handle::try_current()
        .map(|runtime| runtime.runtime_flavor() == RuntimeFlavor::CurrentThread)
        .unwrap_or(false)
}

/// Initialize both pipelines with OTLP/gRPC exporters.
///
/// Must be called from within a Tokio runtime.
pub fn init(config: &TelemetryConfig) -> Result<Telemetry, InitError> {
    init_with(config, &OtlpExporters::default())
}

/// Initialize both pipelines with exporters from `factory`.
///
/// On failure, pipelines that were already built are shut down again before
/// the error is returned, and no global state has been touched.
pub fn init_with<F: ExporterFactory>(
    config: &TelemetryConfig,
    factory: &F,
) -> Result<Telemetry, InitError> {
    let channel = connect(&config.target)?;
    let resource = build_resource(&config.service_name, &config.resource_attributes)?;

    let mut shutdown = ShutdownHandle::new();

    let tracer_provider = init_tracer_provider(factory, &channel, &resource, &config.traces)?;
    shutdown.push(Signal::Traces, {
        let provider = tracer_provider.clone();
        move |timeout| provider.shutdown_with_timeout(timeout)
    });

    let meter_provider =
        match init_meter_provider(factory, &channel, &resource, &config.metrics) {
            Ok(provider) => provider,
            Err(err) => {
                rollback(shutdown, config.shutdown_timeout);
                return Err(err);
            }
        };
    shutdown.push(Signal::Metrics, {
        let provider = meter_provider.clone();
        move |timeout| provider.shutdown_with_timeout(timeout)
    });

    if config.install_global {
        global::set_tracer_provider(tracer_provider.clone());
        global::set_meter_provider(meter_provider.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());
        tracing::debug!("Installed global tracer provider, meter provider and propagator");
    }

    tracing::info!(
        service = %config.service_name,
        collector = %config.target,
        "Telemetry initialized"
    );

    Ok(Telemetry {
        tracer_provider,
        meter_provider,
        resource,
        shutdown: Some(shutdown),
        shutdown_timeout: config.shutdown_timeout,
    })
}

fn rollback(handle: ShutdownHandle, timeout: Duration) {
    if handle.is_empty() {
        return;
    }
    tracing::warn!(
        pipelines = handle.len(),
        "Initialization failed, shutting down pipelines already started"
    );
    if let Err(err) = handle.shutdown(timeout) {
        tracing::warn!(error = %err, "Rollback did not complete cleanly");
    }
}
