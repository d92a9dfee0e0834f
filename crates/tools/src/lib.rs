//! Developer tooling: vehicle inspector and per-step telemetry.
//!
//! # Invariants
//! - Tools only read vehicle state; they never drive the simulation.

pub mod inspector;
pub mod telemetry;

pub use inspector::{VehicleInspector, VehicleSummary};
pub use telemetry::{TelemetryError, TelemetryLog, TelemetrySample};
