//! Engine torque curves.
//!
//! The integrator only ever sees `&dyn EngineTorqueCurve`, so a richer curve
//! can be dropped into a profile without touching the dynamics code.

use std::fmt::Debug;

use crate::profile::ProfileError;

/// Maps engine speed to output torque.
///
/// Implementations must be pure and deterministic. `rpm` may be any real
/// number, including negative values while reversing; each curve decides how
/// to treat those.
pub trait EngineTorqueCurve: Debug + Send + Sync {
    /// Torque in N·m at the given engine speed.
    fn torque(&self, rpm: f64) -> f64;
}

/// Flat torque regardless of engine speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTorque {
    pub torque: f64,
}

impl ConstantTorque {
    pub fn new(torque: f64) -> Self {
        Self { torque }
    }
}

impl EngineTorqueCurve for ConstantTorque {
    fn torque(&self, _rpm: f64) -> f64 {
        self.torque
    }
}

/// Piecewise-linear torque table keyed by engine speed.
///
/// Lookups use `|rpm|`, so reverse gets the same curve as forward. Speeds
/// outside the table hold the value of the nearest end point.
#[derive(Debug, Clone, PartialEq)]
pub struct TableTorque {
    points: Vec<(f64, f64)>,
}

impl TableTorque {
    /// Build a table from `(rpm, torque)` points.
    ///
    /// Points must be non-empty, finite, and strictly increasing in rpm.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, ProfileError> {
        if points.is_empty() {
            return Err(ProfileError::TorqueTable("table has no points".into()));
        }
        if let Some((rpm, torque)) = points
            .iter()
            .find(|(rpm, torque)| !rpm.is_finite() || !torque.is_finite())
        {
            return Err(ProfileError::TorqueTable(format!(
                "non-finite point ({rpm}, {torque})"
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(ProfileError::TorqueTable(format!(
                "rpm must be strictly increasing, got {} then {}",
                w[0].0, w[1].0
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl EngineTorqueCurve for TableTorque {
    fn torque(&self, rpm: f64) -> f64 {
        let rpm = rpm.abs();
        // `new` guarantees at least one point.
        let (first, last) = (self.points[0], self.points[self.points.len() - 1]);
        if rpm <= first.0 {
            return first.1;
        }
        if rpm >= last.0 {
            return last.1;
        }
        let upper = self.points.partition_point(|(r, _)| *r <= rpm);
        let (r0, t0) = self.points[upper - 1];
        let (r1, t1) = self.points[upper];
        let s = (rpm - r0) / (r1 - r0);
        t0 + (t1 - t0) * s
    }
}
