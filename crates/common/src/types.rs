use glam::{DQuat, DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Narrow a double-precision pose to a unit-scale render transform.
    pub fn from_pose(position: DVec3, rotation: DQuat) -> Self {
        Self {
            position: position.as_vec3(),
            rotation: Quat::from_xyzw(
                rotation.x as f32,
                rotation.y as f32,
                rotation.z as f32,
                rotation.w as f32,
            ),
            scale: Vec3::ONE,
        }
    }
}

/// Everything a renderer needs to place the car body and spin its wheels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderPose {
    pub body: Transform,
    /// Accumulated front wheel rotation (radians, unwrapped).
    pub front_wheel_spin: f32,
    /// Accumulated rear wheel rotation (radians, unwrapped).
    pub rear_wheel_spin: f32,
    /// Yaw of the front wheels relative to the body (radians).
    pub front_wheel_steer: f32,
}
