//! One simulation step of the single-vehicle model.
//!
//! The step runs in a fixed order, each stage binding its results before the
//! next reads them:
//!
//! 1. weight transfer sets the rear traction ceiling
//! 2. slip ratio gives the tyre force that loads the wheel
//! 3. drivetrain turns fuel pedal into drive force
//! 4. braking, drag and rolling resistance join the saturated drive force
//! 5. wheel spin and body motion are integrated over `dt`
//! 6. steering yaws velocity and heading about [`UP`]
//!
//! The previous step's acceleration drives weight transfer. That one-step lag
//! is part of the model.

use glam::{DQuat, DVec3};

use crate::forces::{
    self, Braking, Drivetrain, free_rolling_rate, max_rear_traction, saturate_traction,
    slip_ratio, slip_traction,
};
use crate::profile::VehicleProfile;
use crate::state::{Controls, UP, VehicleState};

/// Steer angles at or below this magnitude count as straight ahead (rad).
pub const STEER_EPSILON: f64 = 1e-4;

/// Intermediate quantities of one step, kept for inspection and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepForces {
    /// Traction ceiling of the rear axle after weight transfer (N).
    pub max_rear_traction: f64,
    pub slip_ratio: f64,
    /// Tyre force produced by wheel slip, saturated (N).
    pub slip_traction: f64,
    /// Reaction torque of the tyre on one driven wheel (N·m).
    pub traction_torque: f64,
    pub drivetrain: Drivetrain,
    pub braking: Braking,
    /// Drive force actually transmitted to the road (N).
    pub rear_traction: f64,
    pub drag: DVec3,
    pub rolling_resistance: DVec3,
    pub net_force: DVec3,
    pub acceleration: DVec3,
    /// Angular acceleration of the driven wheel (rad/s²).
    pub wheel_angular_acceleration: f64,
    /// Yaw rate applied by the steering stage (rad/s).
    pub yaw_rate: f64,
    /// True when the brake floor stopped the car this step.
    pub brake_stopped: bool,
}

/// Result of [`step`]: the next state and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub state: VehicleState,
    pub forces: StepForces,
}

/// Advance `state` by `dt` seconds and return the new snapshot.
pub fn simulate(
    profile: &VehicleProfile,
    state: &VehicleState,
    controls: &Controls,
    dt: f64,
) -> VehicleState {
    step(profile, state, controls, dt).state
}

/// Advance `state` by `dt` seconds, reporting the forces involved.
///
/// `dt == 0` returns `state` untouched. Negative `dt` is a caller bug.
pub fn step(
    profile: &VehicleProfile,
    state: &VehicleState,
    controls: &Controls,
    dt: f64,
) -> StepReport {
    debug_assert!(dt >= 0.0, "negative timestep {dt}");
    if dt == 0.0 {
        return StepReport {
            state: *state,
            forces: StepForces::default(),
        };
    }

    let p = profile.params();
    let r = p.wheel_radius;
    let v = state.velocity;
    let u = state.direction;

    let steer_angle = controls.steering.clamp(-1.0, 1.0) * p.max_steer_angle;

    // weight transfer
    let ceiling = max_rear_traction(profile, state.transient_acceleration, u);

    // tyre slip
    let rolling_rate = free_rolling_rate(v, u, r);
    let slip = slip_ratio(state.rear_wheel_angular_velocity, r, v, u);
    let tyre_force = slip_traction(p.tyre_traction_constant, slip, ceiling);
    let traction_torque = tyre_force * r;

    // drivetrain and brakes
    let drive = forces::drivetrain(profile, rolling_rate, controls.fuel_pedal);
    let brake = forces::braking(profile, v, u, controls.brake_pedal);

    // body forces
    let rear_traction = saturate_traction(drive.drive_force, ceiling);
    let drag = forces::drag(p.drag_coefficient, v);
    let rolling = forces::rolling_resistance(p.rolling_resistance, v);
    let net_force = u * rear_traction + drag + rolling + brake.force;
    let acceleration = net_force / p.mass;

    // driven wheel
    let wheel_torque = drive.drive_torque - 2.0 * traction_torque - brake.torque;
    let wheel_angular_acceleration = wheel_torque / profile.wheel_inertia();
    let wheel_rate = state.rear_wheel_angular_velocity + wheel_angular_acceleration * dt;

    // body motion
    let center = state.center + v * dt + acceleration * (0.5 * dt * dt);
    let brake_stopped = v.length() < brake.force.length() * dt / p.mass;
    let mut velocity = if brake_stopped {
        DVec3::ZERO
    } else {
        v + acceleration * dt
    };
    let mut direction = u;

    // steering
    let mut yaw_rate = 0.0;
    if steer_angle.abs() > STEER_EPSILON {
        let turning_radius = profile.wheelbase() / steer_angle.sin();
        let forward = velocity.dot(direction);
        // sign(0) is 0: a car sliding exactly sideways does not yaw.
        let heading_sign = if forward == 0.0 { 0.0 } else { forward.signum() };
        yaw_rate = heading_sign * velocity.length() / turning_radius;
        let yaw = DQuat::from_axis_angle(UP, yaw_rate * dt);
        velocity = yaw * velocity;
        direction = yaw * direction;
    }

    let next = VehicleState {
        center,
        velocity,
        direction,
        front_wheel_angular_deviation: state.front_wheel_angular_deviation + rolling_rate * dt,
        rear_wheel_angular_deviation: state.rear_wheel_angular_deviation + wheel_rate * dt,
        // Slip only lives within a step; the wheel rolls freely into the next one.
        rear_wheel_angular_velocity: free_rolling_rate(velocity, direction, r),
        front_wheel_steer_angle: steer_angle,
        transient_acceleration: acceleration,
    };

    tracing::trace!(
        rpm = drive.engine_rpm,
        drive_force = drive.drive_force,
        ceiling,
        slip,
        brake_stopped,
        "integrated step"
    );

    StepReport {
        state: next,
        forces: StepForces {
            max_rear_traction: ceiling,
            slip_ratio: slip,
            slip_traction: tyre_force,
            traction_torque,
            drivetrain: drive,
            braking: brake,
            rear_traction,
            drag,
            rolling_resistance: rolling,
            net_force,
            acceleration,
            wheel_angular_acceleration,
            yaw_rate,
            brake_stopped,
        },
    }
}
