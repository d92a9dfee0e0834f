use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// World vertical axis. Steering yaws about it.
pub const UP: DVec3 = DVec3::Y;

/// Forward axis of the car body in model space.
pub const FRONT: DVec3 = DVec3::Z;

/// Mutable dynamics state of one vehicle.
///
/// A value type: the integrator takes one snapshot and returns the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// World-space position of the center of gravity.
    pub center: DVec3,
    /// World-space linear velocity.
    pub velocity: DVec3,
    /// Heading of the body. Expected unit length, never renormalized here.
    pub direction: DVec3,
    /// Driven (rear) wheel spin rate in rad/s.
    pub rear_wheel_angular_velocity: f64,
    /// Unwrapped rear wheel rotation for mesh animation (rad).
    pub rear_wheel_angular_deviation: f64,
    /// Unwrapped front wheel rotation for mesh animation (rad).
    pub front_wheel_angular_deviation: f64,
    /// Current front wheel yaw relative to the body (rad).
    pub front_wheel_steer_angle: f64,
    /// Acceleration from the previous step, used for weight transfer.
    pub transient_acceleration: DVec3,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            velocity: DVec3::ZERO,
            direction: FRONT,
            rear_wheel_angular_velocity: 0.0,
            rear_wheel_angular_deviation: 0.0,
            front_wheel_angular_deviation: 0.0,
            front_wheel_steer_angle: 0.0,
            transient_acceleration: DVec3::ZERO,
        }
    }
}

impl VehicleState {
    /// A car at rest at `center`, facing `direction`.
    pub fn at_rest(center: DVec3, direction: DVec3) -> Self {
        Self {
            center,
            direction,
            ..Self::default()
        }
    }

    /// A car at `center` rolling freely along `direction` at `speed` m/s.
    pub fn rolling(center: DVec3, direction: DVec3, speed: f64, wheel_radius: f64) -> Self {
        Self {
            center,
            direction,
            velocity: direction * speed,
            rear_wheel_angular_velocity: speed * direction.length_squared() / wheel_radius,
            ..Self::default()
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Signed speed along the heading.
    pub fn forward_speed(&self) -> f64 {
        self.velocity.dot(self.direction)
    }

    /// Body rotation taking [`FRONT`] onto the current heading.
    ///
    /// A degenerate heading yields the identity.
    pub fn orientation(&self) -> DQuat {
        let heading = self.direction.normalize_or_zero();
        if heading == DVec3::ZERO {
            return DQuat::IDENTITY;
        }
        DQuat::from_rotation_arc(FRONT, heading)
    }
}

/// Driver intent for one frame.
///
/// Pedals are accumulated from press/release edges upstream and may leave
/// the nominal `[-1, 1]` range when several keys are held; they are used
/// as given. Negative fuel drives in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Controls {
    pub fuel_pedal: f64,
    pub brake_pedal: f64,
    /// Normalized steering, positive turns left. Clamped to `[-1, 1]`.
    #[serde(default)]
    pub steering: f64,
}

impl Controls {
    pub fn new(fuel_pedal: f64, brake_pedal: f64) -> Self {
        Self {
            fuel_pedal,
            brake_pedal,
            steering: 0.0,
        }
    }

    pub fn with_steering(self, steering: f64) -> Self {
        Self { steering, ..self }
    }

    /// Whether both pedals sit in the nominal `[-1, 1]` range.
    pub fn is_nominal(&self) -> bool {
        self.fuel_pedal.abs() <= 1.0 && self.brake_pedal.abs() <= 1.0
    }
}
