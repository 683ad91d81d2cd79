use glam::{Mat4, Vec3};

use crate::config::{JitterSettings, PipelineConfig};

use super::{project_to_screen, ConvergencePoint, OrbitControls, PerspectiveCamera};

/// Idle offset of the rig's parent at `elapsed` seconds.
///
/// Each axis is a product of three sines at unrelated frequencies, so the
/// motion does not visibly repeat.
pub fn jitter_offset(settings: &JitterSettings, elapsed: f32) -> Vec3 {
    let t = elapsed * settings.time_scale;
    let a = settings.amplitude;
    Vec3::new(
        a * t.sin() * (t * 2.1).sin() * (t * 4.3).sin(),
        a * (t * 1.23).sin() * (t * 4.56).sin() * (t * 7.89).sin(),
        a * (t * 3.45).sin() * (t * 6.78).sin() * (t * 9.01).sin(),
    )
}

/// Rotation turning an object's +Z axis from the origin toward `eye`.
pub fn billboard_towards(eye: Vec3) -> Mat4 {
    if eye.length_squared() <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    let world = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).inverse();
    let (_, rotation, _) = world.to_scale_rotation_translation();
    Mat4::from_quat(rotation)
}

/// Camera plus parent transform.
///
/// World matrix: `T(jitter) * camera.local_matrix() * Rz(roll)`.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    jitter: JitterSettings,
    roll_per_tick: f32,
    roll: f32,
    offset: Vec3,
}

impl CameraRig {
    pub fn new(config: &PipelineConfig, aspect: f32) -> Self {
        let mut camera = PerspectiveCamera::new(&config.camera, aspect);
        let controls = OrbitControls::new(config.orbit);
        camera.look_at(controls.target);
        Self {
            camera,
            controls,
            jitter: config.jitter,
            roll_per_tick: config.roll_per_tick,
            roll: 0.0,
            offset: Vec3::ZERO,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.camera.aspect = aspect;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.camera.aspect
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Parent translation applied last tick.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Advances the rig by one tick at `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32) {
        self.controls.update(&mut self.camera);
        self.roll += self.roll_per_tick;
        self.offset = jitter_offset(&self.jitter, elapsed);
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.offset)
            * self.camera.local_matrix()
            * Mat4::from_rotation_z(self.roll)
    }

    pub fn view(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.camera.projection() * self.view()
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix().w_axis.truncate()
    }

    /// World origin projected under the current transform.
    pub fn convergence(&self) -> ConvergencePoint {
        project_to_screen(self.view_proj(), Vec3::ZERO)
    }
}
