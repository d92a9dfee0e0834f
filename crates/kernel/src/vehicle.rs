use carsim_common::{RenderPose, Transform};
use glam::DQuat;
use serde::{Deserialize, Serialize};

use crate::integrator::{self, StepForces};
use crate::profile::VehicleProfile;
use crate::state::{Controls, VehicleState};

/// Upper bound on sub-steps per [`Vehicle::simulate_substepped`] call.
pub const MAX_SUBSTEPS: u64 = 1024;

/// An event record produced by every mutation of a vehicle.
///
/// Replaying the log against the same profile reproduces the state bit for
/// bit, which is what the determinism checks rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VehicleEvent {
    /// State was replaced wholesale (construction or teleport).
    Reset { state: VehicleState },
    /// Simulation advanced one step with the given input.
    Stepped {
        tick: u64,
        controls: Controls,
        dt: f64,
    },
}

/// One simulated car: an immutable profile and exactly one live state.
///
/// Every step swaps in a fresh [`VehicleState`]; nothing is updated in place.
#[derive(Debug, Clone)]
pub struct Vehicle {
    profile: VehicleProfile,
    state: VehicleState,
    tick: u64,
    elapsed: f64,
    last_forces: StepForces,
    /// Append-only log of all mutations.
    event_log: Vec<VehicleEvent>,
}

impl Vehicle {
    /// A vehicle at rest at the origin, facing [`crate::FRONT`].
    pub fn new(profile: VehicleProfile) -> Self {
        Self::with_state(profile, VehicleState::default())
    }

    pub fn with_state(profile: VehicleProfile, state: VehicleState) -> Self {
        Self {
            profile,
            state,
            tick: 0,
            elapsed: 0.0,
            last_forces: StepForces::default(),
            event_log: vec![VehicleEvent::Reset { state }],
        }
    }

    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    /// Read-only view of the live state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Number of steps taken.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since construction.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Force breakdown of the most recent step.
    pub fn last_forces(&self) -> &StepForces {
        &self.last_forces
    }

    pub fn events(&self) -> &[VehicleEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<VehicleEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Replace the live state, e.g. to respawn the car.
    pub fn reset(&mut self, state: VehicleState) {
        self.state = state;
        self.last_forces = StepForces::default();
        self.event_log.push(VehicleEvent::Reset { state });
    }

    /// Advance the vehicle by one frame.
    pub fn simulate(&mut self, controls: Controls, dt: f64) {
        let _span = tracing::debug_span!("vehicle_step", tick = self.tick).entered();
        if !controls.is_nominal() {
            tracing::debug!(
                fuel = controls.fuel_pedal,
                brake = controls.brake_pedal,
                "pedal input outside [-1, 1]"
            );
        }

        let report = integrator::step(&self.profile, &self.state, &controls, dt);
        self.state = report.state;
        // A zero-length step computes no forces; keep showing the last real ones.
        if dt != 0.0 {
            self.last_forces = report.forces;
        }
        self.tick += 1;
        self.elapsed += dt;
        self.event_log.push(VehicleEvent::Stepped {
            tick: self.tick,
            controls,
            dt,
        });
    }

    /// Advance by `dt`, split into equal sub-steps no longer than `max_step`.
    ///
    /// Large frame times make the explicit integrator unstable; callers that
    /// want bounded error per step go through here. At most
    /// [`MAX_SUBSTEPS`] sub-steps are taken; non-finite input is ignored.
    pub fn simulate_substepped(&mut self, controls: Controls, dt: f64, max_step: f64) {
        if !dt.is_finite() || !max_step.is_finite() {
            tracing::debug!(dt, max_step, "ignoring non-finite frame time");
            return;
        }
        if dt <= 0.0 || max_step <= 0.0 {
            self.simulate(controls, dt);
            return;
        }
        let wanted = (dt / max_step).ceil().max(1.0);
        if wanted > MAX_SUBSTEPS as f64 {
            tracing::debug!(dt, max_step, cap = MAX_SUBSTEPS, "sub-step count capped");
        }
        let count = wanted.min(MAX_SUBSTEPS as f64) as u64;
        let sub_dt = dt / count as f64;
        for _ in 0..count {
            self.simulate(controls, sub_dt);
        }
    }

    /// Body rotation for rendering.
    pub fn orientation(&self) -> DQuat {
        self.state.orientation()
    }

    /// Pose handed to the scene graph after each step.
    pub fn render_pose(&self) -> RenderPose {
        RenderPose {
            body: Transform::from_pose(self.state.center, self.orientation()),
            front_wheel_spin: self.state.front_wheel_angular_deviation as f32,
            rear_wheel_spin: self.state.rear_wheel_angular_deviation as f32,
            front_wheel_steer: self.state.front_wheel_steer_angle as f32,
        }
    }

    /// Rebuild a vehicle by re-running a recorded event log.
    pub fn replay(profile: VehicleProfile, events: &[VehicleEvent]) -> Self {
        let mut vehicle = Self::new(profile);
        vehicle.event_log.clear();
        for event in events {
            match event {
                VehicleEvent::Reset { state } => vehicle.reset(*state),
                VehicleEvent::Stepped { controls, dt, .. } => vehicle.simulate(*controls, *dt),
            }
        }
        vehicle
    }

    /// Deterministic FNV-1a hash over the exact bits of the live state.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let s = &self.state;
        mix(&mut h, &self.tick.to_le_bytes());
        for v in [s.center, s.velocity, s.direction, s.transient_acceleration] {
            for c in v.to_array() {
                mix(&mut h, &c.to_bits().to_le_bytes());
            }
        }
        for c in [
            s.rear_wheel_angular_velocity,
            s.rear_wheel_angular_deviation,
            s.front_wheel_angular_deviation,
            s.front_wheel_steer_angle,
        ] {
            mix(&mut h, &c.to_bits().to_le_bytes());
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FRONT;
    use glam::DVec3;

    fn drive_some(v: &mut Vehicle) {
        for i in 0..120 {
            let controls = if i < 60 {
                Controls::new(1.0, 0.0)
            } else {
                Controls::new(0.0, 0.5).with_steering(0.3)
            };
            v.simulate(controls, 1.0 / 60.0);
        }
    }

    #[test]
    fn vehicle_starts_at_rest() {
        let v = Vehicle::new(VehicleProfile::reference());
        assert_eq!(v.tick(), 0);
        assert_eq!(v.elapsed(), 0.0);
        assert_eq!(*v.state(), VehicleState::default());
        assert_eq!(v.events().len(), 1);
    }

    #[test]
    fn simulate_advances_tick_and_time() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate(Controls::new(1.0, 0.0), 0.5);
        v.simulate(Controls::new(1.0, 0.0), 0.25);
        assert_eq!(v.tick(), 2);
        assert_eq!(v.elapsed(), 0.75);
        assert!(v.state().velocity.z > 0.0);
        assert!(v.last_forces().max_rear_traction > 0.0);
    }

    #[test]
    fn events_are_recorded() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate(Controls::default(), 0.1);
        v.reset(VehicleState::default());
        v.simulate(Controls::default(), 0.1);
        // reset + step + reset + step
        assert_eq!(v.events().len(), 4);
        assert!(matches!(v.events()[1], VehicleEvent::Stepped { tick: 1, .. }));
    }

    #[test]
    fn drain_events_clears_log() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate(Controls::default(), 0.1);
        assert_eq!(v.drain_events().len(), 2);
        assert!(v.events().is_empty());
    }

    #[test]
    fn replay_reproduces_state_exactly() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        drive_some(&mut v);
        let replayed = Vehicle::replay(VehicleProfile::reference(), v.events());
        assert_eq!(replayed.state(), v.state());
        assert_eq!(replayed.tick(), v.tick());
        assert_eq!(replayed.state_hash(), v.state_hash());
        assert_eq!(replayed.events(), v.events());
    }

    #[test]
    fn replay_honours_resets() {
        let start = VehicleState::at_rest(DVec3::new(10.0, 0.0, 0.0), DVec3::X);
        let mut v = Vehicle::with_state(VehicleProfile::reference(), start);
        drive_some(&mut v);
        let replayed = Vehicle::replay(VehicleProfile::reference(), v.events());
        assert_eq!(replayed.state_hash(), v.state_hash());
        assert!(replayed.state().center.x > 10.0);
    }

    #[test]
    fn state_hash_tracks_state() {
        let mut a = Vehicle::new(VehicleProfile::reference());
        let mut b = Vehicle::new(VehicleProfile::reference());
        assert_eq!(a.state_hash(), b.state_hash());
        a.simulate(Controls::new(1.0, 0.0), 0.1);
        b.simulate(Controls::new(0.5, 0.0), 0.1);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn substeps_cover_whole_interval() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate_substepped(Controls::new(1.0, 0.0), 0.1, 1.0 / 60.0);
        assert_eq!(v.tick(), 6);
        assert!((v.elapsed() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn substepping_matches_fine_steps() {
        let mut coarse = Vehicle::new(VehicleProfile::reference());
        let mut fine = Vehicle::new(VehicleProfile::reference());
        coarse.simulate_substepped(Controls::new(1.0, 0.0), 0.5, 0.05);
        for _ in 0..10 {
            fine.simulate(Controls::new(1.0, 0.0), 0.05);
        }
        assert_eq!(coarse.state(), fine.state());
    }

    #[test]
    fn substep_count_is_capped() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate_substepped(Controls::new(1.0, 0.0), 1.0, 1e-12);
        assert_eq!(v.tick(), MAX_SUBSTEPS);
        assert!((v.elapsed() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_frame_time_is_ignored() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate_substepped(Controls::new(1.0, 0.0), f64::INFINITY, 0.01);
        v.simulate_substepped(Controls::new(1.0, 0.0), 0.1, f64::NAN);
        assert_eq!(v.tick(), 0);
        assert_eq!(v.events().len(), 1);
        assert_eq!(*v.state(), VehicleState::default());
    }

    #[test]
    fn zero_dt_keeps_last_forces() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        v.simulate(Controls::new(1.0, 0.0), 0.1);
        v.simulate(Controls::new(1.0, 0.0), 0.1);
        let before = *v.last_forces();
        assert!(before.drivetrain.engine_rpm > 0.0);
        v.simulate(Controls::new(1.0, 0.0), 0.0);
        assert_eq!(*v.last_forces(), before);
        assert_eq!(v.tick(), 3);
    }

    #[test]
    fn render_pose_follows_state() {
        let start = VehicleState::at_rest(DVec3::new(1.0, 0.0, 2.0), DVec3::X);
        let v = Vehicle::with_state(VehicleProfile::reference(), start);
        let pose = v.render_pose();
        assert_eq!(pose.body.position, glam::Vec3::new(1.0, 0.0, 2.0));
        let forward = pose.body.rotation * glam::Vec3::Z;
        assert!(forward.abs_diff_eq(glam::Vec3::X, 1e-6));
        assert_eq!(pose.front_wheel_steer, 0.0);
    }

    #[test]
    fn render_pose_reports_wheel_spin() {
        let mut v = Vehicle::new(VehicleProfile::reference());
        for _ in 0..30 {
            v.simulate(Controls::new(1.0, 0.0).with_steering(1.0), 1.0 / 60.0);
        }
        let pose = v.render_pose();
        assert!(pose.front_wheel_spin > 0.0);
        assert!(pose.rear_wheel_spin > pose.front_wheel_spin);
        assert!(pose.front_wheel_steer > 0.0);
        assert_ne!(v.state().direction, FRONT);
    }
}
