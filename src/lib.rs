//! Lantern: wires an application to an OTLP collector.
//!
//! Lantern builds a trace pipeline and a metric pipeline over one shared gRPC
//! connection, hands both to the caller through an explicit [`Telemetry`]
//! context, and shuts them down together with aggregated errors.
//!
//! # Architecture
//!
//! - **One connection**: both OTLP exporters ride the same lazily connected channel
//! - **Explicit context**: tracers and meters come from [`Telemetry`], not ambient globals
//! - **Ordered lifecycle**: pipelines are rolled back in reverse order on failed startup
//! - **Aggregated shutdown**: every pipeline is flushed, every failure reported
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`observability`]: connection, resource, pipelines and lifecycle
//! - [`workload`]: the sample workload that emits spans and counters
//!
//! [`Telemetry`]: observability::Telemetry

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // observability::traces::TraceSettings is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod observability;
pub mod workload;

pub use observability::{init, init_with, InitError, ShutdownError, Signal, Telemetry};

/// Instrumentation scope name used for the tracer and meter of this crate.
pub const INSTRUMENTATION_NAME: &str = env!("CARGO_PKG_NAME");
