use glam::{Mat4, Quat, Vec3};

use crate::config::CameraSettings;

/// Perspective camera in the rig's local space.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub orientation: Quat,
}

impl PerspectiveCamera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            fov_y: settings.fov_y_degrees.to_radians(),
            aspect,
            near: settings.near,
            far: settings.far,
            position: settings.start_position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Right-handed projection with a `[0, 1]` depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Turns the camera so its -Z axis points at `target`, Y up.
    pub fn look_at(&mut self, target: Vec3) {
        if (target - self.position).length_squared() <= f32::EPSILON {
            return;
        }
        let world = Mat4::look_at_rh(self.position, target, Vec3::Y).inverse();
        let (_, rotation, _) = world.to_scale_rotation_translation();
        self.orientation = rotation;
    }

    /// Transform from camera space into the rig's space.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}
