//! Static pipeline configuration.
//!
//! Every constant the scenes, camera and scheduler depend on lives here so the
//! viewer can override a subset from the command line.

use glam::Vec3;
use horizon_engine::paint::Color;

use crate::params::ParameterDefaults;

/// Perspective camera settings.
#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub start_position: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 35.0,
            near: 0.1,
            far: 500.0,
            start_position: Vec3::new(0.0, 3.0, 10.0),
        }
    }
}

/// Orbit/zoom controller settings.
#[derive(Debug, Clone, Copy)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 0.4,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Idle motion of the rig's parent transform.
#[derive(Debug, Clone, Copy)]
pub struct JitterSettings {
    pub amplitude: f32,
    /// Multiplier applied to elapsed seconds before the sine products.
    pub time_scale: f32,
}

impl Default for JitterSettings {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            time_scale: 0.2,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub star_count: usize,
    pub star_seed: u64,
    /// Clear color of the world and composition passes.
    pub clear_color: Color,
    /// Upper bound applied to the platform device pixel ratio.
    pub max_pixel_ratio: f32,
    pub camera: CameraSettings,
    pub orbit: OrbitSettings,
    pub jitter: JitterSettings,
    /// Roll added to the camera every tick, in radians.
    pub roll_per_tick: f32,
    /// Edge length of the square noise bake target.
    pub noise_size: u32,
    pub parameters: ParameterDefaults,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            star_count: 10_000,
            star_seed: 0x5EED_B1AC_401E,
            clear_color: Color::from_u8(0x13, 0x0e, 0x16, 0xff),
            max_pixel_ratio: 2.0,
            camera: CameraSettings::default(),
            orbit: OrbitSettings::default(),
            jitter: JitterSettings::default(),
            roll_per_tick: 0.2,
            noise_size: 256,
            parameters: ParameterDefaults::default(),
        }
    }
}
