use carsim_kernel::Vehicle;

const MS_TO_KMH: f64 = 3.6;

/// Read-only queries against a vehicle for debugging and HUD output.
pub struct VehicleInspector;

impl VehicleInspector {
    /// Produce a summary of the vehicle's current state.
    pub fn summary(vehicle: &Vehicle) -> VehicleSummary {
        let s = vehicle.state();
        let forces = vehicle.last_forces();
        VehicleSummary {
            tick: vehicle.tick(),
            elapsed: vehicle.elapsed(),
            speed_kmh: s.speed() * MS_TO_KMH,
            forward_speed: s.forward_speed(),
            engine_rpm: forces.drivetrain.engine_rpm,
            traction_limited: forces.drivetrain.drive_force.abs() > forces.max_rear_traction,
            position: s.center.to_array(),
            heading_deg: s.direction.x.atan2(s.direction.z).to_degrees(),
            steer_deg: s.front_wheel_steer_angle.to_degrees(),
        }
    }
}

/// Snapshot of vehicle state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSummary {
    pub tick: u64,
    pub elapsed: f64,
    pub speed_kmh: f64,
    /// Signed speed along the heading (m/s).
    pub forward_speed: f64,
    /// Engine speed seen by the last step.
    pub engine_rpm: f64,
    /// Whether the last step's drive force hit the tyre limit.
    pub traction_limited: bool,
    pub position: [f64; 3],
    /// Yaw of the heading, counter-clockwise from +Z about +Y.
    pub heading_deg: f64,
    pub steer_deg: f64,
}

impl std::fmt::Display for VehicleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Vehicle: tick={} t={:.2}s speed={:.1}km/h rpm={:.0} pos=({:.2}, {:.2}, {:.2}) heading={:.1}° steer={:.1}°{}",
            self.tick,
            self.elapsed,
            self.speed_kmh,
            self.engine_rpm,
            self.position[0],
            self.position[1],
            self.position[2],
            self.heading_deg,
            self.steer_deg,
            if self.traction_limited { " [wheelspin]" } else { "" },
        )
    }
}
