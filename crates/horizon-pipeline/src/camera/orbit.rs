use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::config::OrbitSettings;

use super::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Spherical orbit around a target with optional damping.
///
/// Input accumulates into a pending delta; [`update`](Self::update) applies a
/// fraction of it (all of it without damping) and decays the rest.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub settings: OrbitSettings,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            target: Vec3::ZERO,
            settings,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Rotates around the vertical axis by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Pointer drag in logical pixels over a viewport `height` tall. A full
    /// viewport height turns one revolution.
    pub fn drag(&mut self, dx: f32, dy: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        let k = TAU * self.settings.rotate_speed / height;
        self.rotate_left(k * dx);
        self.rotate_up(k * dy);
    }

    /// Wheel input in notches; positive moves toward the target.
    pub fn zoom(&mut self, notches: f32) {
        if notches == 0.0 {
            return;
        }
        self.scale *= 0.95f32.powf(self.settings.zoom_speed * notches);
    }

    /// Applies pending input to `camera` and turns it toward the target.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let k = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * k;
        phi += self.delta_phi * k;

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.settings.min_distance, self.settings.max_distance);

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.settings.enable_damping {
            self.delta_theta *= 1.0 - self.settings.damping_factor;
            self.delta_phi *= 1.0 - self.settings.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    fn undamped() -> OrbitControls {
        OrbitControls::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        })
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraSettings::default(), 4.0 / 3.0)
    }

    #[test]
    fn update_without_input_keeps_position() {
        let mut cam = camera();
        let mut controls = undamped();
        controls.update(&mut cam);
        assert!((cam.position - Vec3::new(0.0, 3.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn quarter_turn_moves_camera_around_y() {
        let mut cam = camera();
        let mut controls = undamped();
        controls.rotate_left(PI / 2.0);
        controls.update(&mut cam);
        assert!((cam.position - Vec3::new(-10.0, 3.0, 0.0)).length() < 1e-4);

        let forward = cam.orientation * Vec3::NEG_Z;
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!(forward.dot(expected) > 0.9999);
    }

    #[test]
    fn damping_spreads_rotation_over_updates() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(OrbitSettings::default());
        controls.rotate_left(1.0);
        controls.update(&mut cam);

        let theta = cam.position.x.atan2(cam.position.z);
        assert!((theta + 0.05).abs() < 1e-4);

        for _ in 0..400 {
            controls.update(&mut cam);
        }
        let theta = cam.position.x.atan2(cam.position.z);
        assert!((theta + 1.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_in_scales_distance() {
        let mut cam = camera();
        let mut controls = undamped();
        let before = cam.position.length();
        controls.zoom(1.0);
        controls.update(&mut cam);
        let ratio = cam.position.length() / before;
        assert!((ratio - 0.95f32.powf(0.4)).abs() < 1e-5);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let mut cam = camera();
        let mut controls = undamped();
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        assert!(cam.position.is_finite());
        assert!(cam.orientation.is_finite());
        assert!(cam.position.y > 0.0);
    }
}
