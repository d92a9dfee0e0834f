//! Per-stage force and torque terms of one integration step.
//!
//! Each function is a pure piece of the step so the stages can be checked in
//! isolation: weight transfer, tyre slip, drivetrain, braking.

use std::f64::consts::PI;

use glam::DVec3;

use crate::profile::VehicleProfile;

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.8;

/// Below this speed the slip ratio and brake direction are taken as zero.
pub const SPEED_EPSILON: f64 = 1e-6;

const RAD_PER_SEC_TO_RPM: f64 = 60.0 / (2.0 * PI);

/// Traction ceiling of the driven (rear) axle.
///
/// Static load on the rear axle plus the longitudinal weight transfer caused
/// by `acceleration` along `direction`. Never negative.
pub fn max_rear_traction(profile: &VehicleProfile, acceleration: DVec3, direction: DVec3) -> f64 {
    let p = profile.params();
    let wheelbase = profile.wheelbase();
    let static_weight = GRAVITY * p.mass;
    let dynamic_weight =
        p.center_of_gravity_height / wheelbase * p.mass * acceleration.dot(direction);
    let rear_load = p.front_axle_displacement / wheelbase * static_weight + dynamic_weight;
    (p.tyre_friction_mu * rear_load).max(0.0)
}

/// Wheel spin rate with zero slip.
pub fn free_rolling_rate(velocity: DVec3, direction: DVec3, wheel_radius: f64) -> f64 {
    velocity.dot(direction) / wheel_radius
}

/// Normalized difference between wheel surface speed and ground speed.
///
/// Zero when the car is (numerically) at rest.
pub fn slip_ratio(
    wheel_angular_velocity: f64,
    wheel_radius: f64,
    velocity: DVec3,
    direction: DVec3,
) -> f64 {
    let speed = velocity.length();
    if speed < SPEED_EPSILON {
        return 0.0;
    }
    (wheel_angular_velocity * wheel_radius - velocity.dot(direction)) / speed
}

/// Linear tyre force from slip, saturated at `ceiling` in either direction.
///
/// The plain `min(k·slip, ceiling)` form only bounds positive slip; negative
/// slip is clamped to `-ceiling` here as well.
pub fn slip_traction(traction_constant: f64, slip_ratio: f64, ceiling: f64) -> f64 {
    (traction_constant * slip_ratio).clamp(-ceiling, ceiling)
}

/// Drive force limited to what the tyres can carry, keeping its sign.
pub fn saturate_traction(drive_force: f64, ceiling: f64) -> f64 {
    drive_force.abs().min(ceiling).copysign(drive_force)
}

/// Engine side of the drivetrain for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Drivetrain {
    pub engine_rpm: f64,
    /// Crank torque after the fuel pedal (N·m).
    pub engine_torque: f64,
    /// Torque delivered to the driven axle (N·m).
    pub drive_torque: f64,
    /// Drive torque expressed as a force at the contact patch (N).
    pub drive_force: f64,
}

/// Run the wheel rate back up through the gearbox, evaluate the engine and
/// bring the torque down to the axle.
pub fn drivetrain(profile: &VehicleProfile, free_rolling_rate: f64, fuel_pedal: f64) -> Drivetrain {
    let p = profile.params();
    let ratio = profile.total_drive_ratio();
    let engine_rpm = free_rolling_rate * ratio * RAD_PER_SEC_TO_RPM;
    let engine_torque = profile.engine().torque(engine_rpm) * fuel_pedal;
    let drive_torque = engine_torque * ratio * p.transmission_efficiency;
    Drivetrain {
        engine_rpm,
        engine_torque,
        drive_torque,
        drive_force: drive_torque / p.wheel_radius,
    }
}

/// Braking terms for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Braking {
    /// Cosine between the direction of travel and the heading.
    pub direction_cosine: f64,
    /// Torque resisting wheel spin (N·m).
    pub torque: f64,
    /// Force on the body along the heading.
    pub force: DVec3,
}

/// Brake force always opposes the current motion projected on the heading.
pub fn braking(profile: &VehicleProfile, velocity: DVec3, direction: DVec3, brake_pedal: f64) -> Braking {
    let p = profile.params();
    let travel = if velocity.length() < SPEED_EPSILON {
        DVec3::ZERO
    } else {
        velocity.normalize()
    };
    let direction_cosine = travel.dot(direction);
    let pedal_force = p.braking_power * brake_pedal;
    Braking {
        direction_cosine,
        torque: p.braking_power / p.wheel_radius * direction_cosine * brake_pedal,
        force: direction * (-pedal_force * direction_cosine),
    }
}

/// Aerodynamic drag, quadratic in speed.
pub fn drag(drag_coefficient: f64, velocity: DVec3) -> DVec3 {
    velocity * (-drag_coefficient * velocity.length())
}

/// Rolling resistance, linear in speed.
pub fn rolling_resistance(coefficient: f64, velocity: DVec3) -> DVec3 {
    velocity * -coefficient
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FRONT;

    fn profile() -> VehicleProfile {
        VehicleProfile::reference()
    }

    #[test]
    fn static_traction_uses_rear_load_share() {
        // 1500 kg, wheelbase split 1:1, mu = 1
        let t = max_rear_traction(&profile(), DVec3::ZERO, FRONT);
        assert!((t - 0.5 * 1500.0 * GRAVITY).abs() < 1e-9);
    }

    #[test]
    fn forward_acceleration_raises_traction() {
        let p = profile();
        let base = max_rear_traction(&p, DVec3::ZERO, FRONT);
        let accel = max_rear_traction(&p, FRONT * 3.0, FRONT);
        assert!(accel > base);
        // h / L * m * a = 1 / 2 * 1500 * 3
        assert!((accel - base - 2250.0).abs() < 1e-9);
    }

    #[test]
    fn braking_lowers_traction() {
        let p = profile();
        let base = max_rear_traction(&p, DVec3::ZERO, FRONT);
        let decel = max_rear_traction(&p, FRONT * -3.0, FRONT);
        assert!(decel < base);
    }

    #[test]
    fn lateral_acceleration_does_not_transfer_weight() {
        let p = profile();
        let base = max_rear_traction(&p, DVec3::ZERO, FRONT);
        assert_eq!(max_rear_traction(&p, DVec3::X * 5.0, FRONT), base);
    }

    #[test]
    fn traction_ceiling_never_negative() {
        let t = max_rear_traction(&profile(), FRONT * -100.0, FRONT);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn slip_ratio_is_zero_at_rest() {
        let s = slip_ratio(250.0, 0.34, DVec3::ZERO, FRONT);
        assert_eq!(s, 0.0);
        assert!(slip_ratio(-250.0, 0.34, DVec3::ZERO, FRONT).is_finite());
    }

    #[test]
    fn slip_ratio_is_zero_when_free_rolling() {
        let v = FRONT * 12.0;
        let w = free_rolling_rate(v, FRONT, 0.34);
        assert!(slip_ratio(w, 0.34, v, FRONT).abs() < 1e-12);
    }

    #[test]
    fn wheelspin_gives_positive_slip() {
        let v = FRONT * 10.0;
        // surface speed 15 m/s against 10 m/s ground speed
        let s = slip_ratio(15.0 / 0.5, 0.5, v, FRONT);
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn slip_traction_saturates_both_ways() {
        assert_eq!(slip_traction(20_000.0, 0.125, 5_000.0), 2_500.0);
        assert_eq!(slip_traction(20_000.0, 1.0, 5_000.0), 5_000.0);
        assert_eq!(slip_traction(20_000.0, -1.0, 5_000.0), -5_000.0);
    }

    #[test]
    fn saturate_traction_keeps_sign() {
        assert_eq!(saturate_traction(9_000.0, 7_350.0), 7_350.0);
        assert_eq!(saturate_traction(-9_000.0, 7_350.0), -7_350.0);
        assert_eq!(saturate_traction(1_000.0, 7_350.0), 1_000.0);
    }

    #[test]
    fn drivetrain_at_rest() {
        let d = drivetrain(&profile(), 0.0, 1.0);
        assert_eq!(d.engine_rpm, 0.0);
        assert_eq!(d.engine_torque, 448.0);
        let expected_torque = 448.0 * 2.66 * 3.42 * 0.7;
        assert!((d.drive_torque - expected_torque).abs() < 1e-9);
        assert!((d.drive_force - expected_torque / 0.34).abs() < 1e-9);
    }

    #[test]
    fn drivetrain_rpm_follows_wheel_rate() {
        // one wheel revolution per second
        let d = drivetrain(&profile(), 2.0 * PI, 0.0);
        assert!((d.engine_rpm - 60.0 * 2.66 * 3.42).abs() < 1e-9);
        assert_eq!(d.drive_force, 0.0);
    }

    #[test]
    fn reverse_fuel_reverses_drive_force() {
        let d = drivetrain(&profile(), 0.0, -1.0);
        assert!(d.drive_force < 0.0);
    }

    #[test]
    fn braking_opposes_forward_motion() {
        let b = braking(&profile(), FRONT * 5.0, FRONT, 1.0);
        assert_eq!(b.direction_cosine, 1.0);
        assert_eq!(b.force, FRONT * -10_000.0);
        assert!(b.torque > 0.0);
    }

    #[test]
    fn braking_opposes_reverse_motion() {
        let b = braking(&profile(), FRONT * -5.0, FRONT, 1.0);
        assert_eq!(b.force, FRONT * 10_000.0);
    }

    #[test]
    fn braking_at_rest_is_zero() {
        let b = braking(&profile(), DVec3::ZERO, FRONT, 1.0);
        assert_eq!(b.force.length(), 0.0);
        assert_eq!(b.torque, 0.0);
    }

    #[test]
    fn resistances_oppose_velocity() {
        let v = DVec3::new(3.0, 0.0, 4.0);
        assert_eq!(drag(0.5, v), v * -2.5);
        assert_eq!(rolling_resistance(12.8, v), v * -12.8);
    }
}
