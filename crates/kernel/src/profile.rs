//! Static per-vehicle constants.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{ConstantTorque, EngineTorqueCurve};

/// Errors raised while validating a vehicle profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("invalid torque table: {0}")]
    TorqueTable(String),
}

/// Plain physical and drivetrain constants, in SI units.
///
/// Missing fields deserialize to the reference car, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileParams {
    /// kg
    pub mass: f64,
    pub drag_coefficient: f64,
    pub rolling_resistance: f64,
    /// Total braking force at full pedal (N).
    pub braking_power: f64,
    /// m
    pub center_of_gravity_height: f64,
    /// Distance from the center of gravity to the front axle (m).
    pub front_axle_displacement: f64,
    /// Distance from the center of gravity to the rear axle (m).
    pub rear_axle_displacement: f64,
    pub tyre_friction_mu: f64,
    /// Longitudinal tyre stiffness before saturation (N per unit slip ratio).
    pub tyre_traction_constant: f64,
    pub gear_ratio: f64,
    pub differential_ratio: f64,
    /// 0..=1
    pub transmission_efficiency: f64,
    /// m
    pub wheel_radius: f64,
    /// kg, per driven wheel
    pub wheel_mass: f64,
    /// Front wheel angle at full steering input (rad).
    pub max_steer_angle: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            mass: 1500.0,
            drag_coefficient: 0.4257,
            rolling_resistance: 12.8,
            braking_power: 10_000.0,
            center_of_gravity_height: 1.0,
            front_axle_displacement: 1.0,
            rear_axle_displacement: 1.0,
            tyre_friction_mu: 1.0,
            tyre_traction_constant: 20_000.0,
            gear_ratio: 2.66,
            differential_ratio: 3.42,
            transmission_efficiency: 0.7,
            wheel_radius: 0.34,
            wheel_mass: 15.0,
            max_steer_angle: std::f64::consts::FRAC_PI_4,
        }
    }
}

impl ProfileParams {
    /// Check every precondition the integrator divides by or relies on.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let fields = [
            ("mass", self.mass),
            ("drag_coefficient", self.drag_coefficient),
            ("rolling_resistance", self.rolling_resistance),
            ("braking_power", self.braking_power),
            ("center_of_gravity_height", self.center_of_gravity_height),
            ("front_axle_displacement", self.front_axle_displacement),
            ("rear_axle_displacement", self.rear_axle_displacement),
            ("tyre_friction_mu", self.tyre_friction_mu),
            ("tyre_traction_constant", self.tyre_traction_constant),
            ("gear_ratio", self.gear_ratio),
            ("differential_ratio", self.differential_ratio),
            ("transmission_efficiency", self.transmission_efficiency),
            ("wheel_radius", self.wheel_radius),
            ("wheel_mass", self.wheel_mass),
            ("max_steer_angle", self.max_steer_angle),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ProfileError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("mass", self.mass),
            ("front_axle_displacement", self.front_axle_displacement),
            ("rear_axle_displacement", self.rear_axle_displacement),
            ("tyre_friction_mu", self.tyre_friction_mu),
            ("wheel_radius", self.wheel_radius),
            ("wheel_mass", self.wheel_mass),
        ] {
            if value <= 0.0 {
                return Err(ProfileError::NonPositive { field, value });
            }
        }

        for (field, value) in [
            ("drag_coefficient", self.drag_coefficient),
            ("rolling_resistance", self.rolling_resistance),
            ("braking_power", self.braking_power),
            ("center_of_gravity_height", self.center_of_gravity_height),
            ("tyre_traction_constant", self.tyre_traction_constant),
        ] {
            if value < 0.0 {
                return Err(ProfileError::Negative { field, value });
            }
        }

        range("transmission_efficiency", self.transmission_efficiency, 0.0, 1.0)?;
        // Past a right angle the turning radius starts growing again.
        range("max_steer_angle", self.max_steer_angle, 0.0, FRAC_PI_2)?;
        Ok(())
    }
}

fn range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ProfileError> {
    if value < min || value > max {
        return Err(ProfileError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Validated, immutable vehicle profile.
///
/// Built once per vehicle. Construction is the only place preconditions are
/// checked; the per-step integrator trusts them.
#[derive(Debug, Clone)]
pub struct VehicleProfile {
    params: ProfileParams,
    engine: Arc<dyn EngineTorqueCurve>,
}

impl VehicleProfile {
    /// Validate `params` and pair them with an engine curve.
    pub fn new(
        params: ProfileParams,
        engine: Arc<dyn EngineTorqueCurve>,
    ) -> Result<Self, ProfileError> {
        params.validate()?;
        tracing::debug!(
            mass = params.mass,
            wheelbase = params.front_axle_displacement + params.rear_axle_displacement,
            ?engine,
            "vehicle profile built"
        );
        Ok(Self { params, engine })
    }

    /// The reference car: 1500 kg, 448 N·m flat torque.
    pub fn reference() -> Self {
        Self {
            params: ProfileParams::default(),
            engine: Arc::new(ConstantTorque::new(448.0)),
        }
    }

    pub fn params(&self) -> &ProfileParams {
        &self.params
    }

    pub fn engine(&self) -> &dyn EngineTorqueCurve {
        self.engine.as_ref()
    }

    /// Front plus rear axle displacement.
    pub fn wheelbase(&self) -> f64 {
        self.params.front_axle_displacement + self.params.rear_axle_displacement
    }

    /// Solid-disk moment of inertia of one driven wheel.
    pub fn wheel_inertia(&self) -> f64 {
        let r = self.params.wheel_radius;
        self.params.wheel_mass * r * r / 2.0
    }

    /// Overall reduction from crank to wheel.
    pub fn total_drive_ratio(&self) -> f64 {
        self.params.gear_ratio * self.params.differential_ratio
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TableTorque;

    #[test]
    fn reference_profile_is_valid() {
        assert!(ProfileParams::default().validate().is_ok());
        let p = VehicleProfile::reference();
        assert_eq!(p.params().mass, 1500.0);
        assert_eq!(p.engine().torque(3000.0), 448.0);
    }

    #[test]
    fn derived_quantities() {
        let p = VehicleProfile::reference();
        assert_eq!(p.wheelbase(), 2.0);
        assert!((p.wheel_inertia() - 15.0 * 0.34 * 0.34 / 2.0).abs() < 1e-12);
        assert!((p.total_drive_ratio() - 2.66 * 3.42).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_mass() {
        let params = ProfileParams {
            mass: 0.0,
            ..ProfileParams::default()
        };
        let err = VehicleProfile::new(params, Arc::new(ConstantTorque::new(1.0))).unwrap_err();
        assert_eq!(
            err,
            ProfileError::NonPositive {
                field: "mass",
                value: 0.0
            }
        );
    }

    #[test]
    fn rejects_negative_wheel_radius() {
        let params = ProfileParams {
            wheel_radius: -0.3,
            ..ProfileParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ProfileError::NonPositive {
                field: "wheel_radius",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_axle_displacement() {
        let params = ProfileParams {
            rear_axle_displacement: 0.0,
            ..ProfileParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        let params = ProfileParams {
            drag_coefficient: f64::NAN,
            ..ProfileParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ProfileError::NonFinite {
                field: "drag_coefficient",
                ..
            })
        ));
    }

    #[test]
    fn rejects_efficiency_above_one() {
        let params = ProfileParams {
            transmission_efficiency: 1.2,
            ..ProfileParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("transmission_efficiency"));
    }

    #[test]
    fn rejects_negative_braking_power() {
        let params = ProfileParams {
            braking_power: -1.0,
            ..ProfileParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ProfileError::Negative { .. })
        ));
    }

    #[test]
    fn accepts_table_engine() {
        let table = TableTorque::new(vec![(0.0, 200.0), (6000.0, 400.0)]).unwrap();
        let p = VehicleProfile::new(ProfileParams::default(), Arc::new(table)).unwrap();
        assert_eq!(p.engine().torque(3000.0), 300.0);
    }

    #[test]
    fn partial_json_falls_back_to_reference() {
        let params: ProfileParams = serde_json::from_str(r#"{ "mass": 900.0 }"#).unwrap();
        assert_eq!(params.mass, 900.0);
        assert_eq!(params.wheel_radius, ProfileParams::default().wheel_radius);
    }
}
