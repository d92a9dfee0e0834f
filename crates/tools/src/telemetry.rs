//! Per-step telemetry capture.
//!
//! Samples are plain serde records so a run can be dumped to JSON and
//! plotted offline.

use std::path::Path;

use carsim_kernel::Vehicle;
use serde::{Deserialize, Serialize};

/// Errors from writing telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of telemetry, taken after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub tick: u64,
    pub time: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub direction: [f64; 3],
    pub engine_rpm: f64,
    pub drive_force: f64,
    pub rear_traction: f64,
    pub max_rear_traction: f64,
    pub slip_ratio: f64,
    pub rear_wheel_angular_velocity: f64,
    pub front_wheel_steer_angle: f64,
}

impl TelemetrySample {
    pub fn capture(vehicle: &Vehicle) -> Self {
        let s = vehicle.state();
        let f = vehicle.last_forces();
        Self {
            tick: vehicle.tick(),
            time: vehicle.elapsed(),
            position: s.center.to_array(),
            velocity: s.velocity.to_array(),
            direction: s.direction.to_array(),
            engine_rpm: f.drivetrain.engine_rpm,
            drive_force: f.drivetrain.drive_force,
            rear_traction: f.rear_traction,
            max_rear_traction: f.max_rear_traction,
            slip_ratio: f.slip_ratio,
            rear_wheel_angular_velocity: s.rear_wheel_angular_velocity,
            front_wheel_steer_angle: s.front_wheel_steer_angle,
        }
    }
}

/// Ordered collection of samples, optionally decimated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryLog {
    /// Keep one sample every `stride` ticks (0 and 1 both keep all).
    stride: u64,
    samples: Vec<TelemetrySample>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stride(stride: u64) -> Self {
        Self {
            stride,
            samples: Vec::new(),
        }
    }

    /// Record the vehicle's current state if the stride allows it.
    pub fn record(&mut self, vehicle: &Vehicle) {
        if self.stride > 1 && vehicle.tick() % self.stride != 0 {
            return;
        }
        self.samples.push(TelemetrySample::capture(vehicle));
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Write all samples as a pretty JSON array.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TelemetryError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &self.samples)?;
        tracing::info!(path = %path.display(), samples = self.samples.len(), "telemetry written");
        Ok(())
    }
}
