//! Logging and trace export for shopbot services.
//!
//! Call [`init_telemetry`] once at start-up with a [`TelemetryConfig`]; later calls are
//! no-ops.

mod config;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use tracing_init::{init_telemetry, telemetry_enabled};
