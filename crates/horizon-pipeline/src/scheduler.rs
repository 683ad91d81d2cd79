//! Frame Scheduler.
//!
//! Owns the tick state machine and turns the current camera, parameters and
//! materials into a [`Frame`]. Ticks are cooperative: the host asks for one
//! with [`FrameScheduler::begin_tick`], and [`FrameScheduler::finish_tick`]
//! decides whether another is requested.

use horizon_engine::paint::Color;
use thiserror::Error;

use crate::camera::{billboard_towards, CameraRig};
use crate::frame::{CameraUniform, Frame, Pass, PassId, PassOutput};
use crate::material::TextureSource;
use crate::params::ParameterSnapshot;
use crate::scene::{SceneAssembly, SceneId};
use crate::targets::{PipelineTargets, RenderTargetHandle};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("cannot start the scheduler while {0:?}")]
    InvalidStart(SchedulerState),
}

/// Inputs of one tick.
pub struct TickContext<'a> {
    /// Seconds since the scheduler started.
    pub elapsed: f32,
    pub rig: &'a mut CameraRig,
    pub assembly: &'a mut SceneAssembly,
    pub params: ParameterSnapshot,
    pub targets: PipelineTargets,
    /// Size of the viewport-sized targets in device pixels.
    pub device_size: (u32, u32),
    pub pixel_ratio: f32,
    pub clear_color: Color,
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    /// A next tick has been requested from the host.
    pending: bool,
    in_flight: bool,
    frame_index: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            pending: false,
            in_flight: false,
            frame_index: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }

    /// `Idle -> Running`, scheduling the first tick.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::InvalidStart(self.state));
        }
        self.state = SchedulerState::Running;
        self.pending = true;
        log::debug!("scheduler running");
        Ok(())
    }

    /// Consumes the pending request. Returns `false` when no tick should run.
    pub fn begin_tick(&mut self) -> bool {
        if self.state != SchedulerState::Running || !self.pending || self.in_flight {
            return false;
        }
        self.pending = false;
        self.in_flight = true;
        true
    }

    /// Ends the in-flight tick. Returns `true` when the next one was requested.
    pub fn finish_tick(&mut self) -> bool {
        self.in_flight = false;
        match self.state {
            SchedulerState::Running => {
                self.pending = true;
                true
            }
            SchedulerState::Stopping => {
                self.state = SchedulerState::Stopped;
                log::debug!("scheduler stopped after draining the last tick");
                false
            }
            SchedulerState::Idle | SchedulerState::Stopped => false,
        }
    }

    /// Cancels the pending tick. With a tick in flight the scheduler waits in
    /// `Stopping` for [`finish_tick`](Self::finish_tick). Safe to repeat.
    pub fn stop(&mut self) -> SchedulerState {
        self.pending = false;
        self.state = match self.state {
            SchedulerState::Running if self.in_flight => SchedulerState::Stopping,
            SchedulerState::Stopping => SchedulerState::Stopping,
            _ => SchedulerState::Stopped,
        };
        log::debug!("scheduler {:?}", self.state);
        self.state
    }

    /// Computes one tick.
    ///
    /// Updates the rig and the convergence point, pushes time, convergence
    /// and parameters into the materials, then lists the world, distortion,
    /// composition and dither passes in dependency order.
    pub fn tick(&mut self, ctx: TickContext<'_>) -> Frame {
        let TickContext {
            elapsed,
            rig,
            assembly,
            params,
            targets,
            device_size,
            pixel_ratio,
            clear_color,
        } = ctx;

        rig.update(elapsed);
        let convergence = rig.convergence();

        let materials = &mut assembly.materials;
        materials.hole.uniforms.model = billboard_towards(rig.camera.position).to_cols_array_2d();
        materials.stars.uniforms.pixel_ratio = pixel_ratio;
        materials.disc.uniforms.time = elapsed;
        materials.composition.uniforms.time = elapsed;
        materials.composition.uniforms.convergence = convergence.to_array();

        let dither = &mut materials.dither.uniforms;
        dither.time = elapsed;
        dither.resolution = [device_size.0 as f32, device_size.1 as f32];
        dither.grid_size = params.grid_size;
        dither.intensity = params.intensity;
        dither.contrast = params.contrast;
        dither.background = params.background;

        let assembly = &*assembly;
        let passes = vec![
            scene_pass(
                assembly,
                PassId::World,
                SceneId::World,
                PassOutput::Target(targets.pre_distortion),
                clear_color,
            ),
            scene_pass(
                assembly,
                PassId::Distortion,
                SceneId::Distortion,
                PassOutput::Target(targets.distortion_mask),
                Color::BLACK,
            ),
            scene_pass(
                assembly,
                PassId::Composition,
                SceneId::Composition,
                PassOutput::Target(targets.composed),
                clear_color,
            ),
            scene_pass(
                assembly,
                PassId::Dither,
                SceneId::Dither,
                PassOutput::Surface,
                clear_color,
            ),
        ];

        let viewport = [device_size.0 as f32, device_size.1 as f32, pixel_ratio, 0.0];
        let index = self.frame_index;
        self.frame_index += 1;

        Frame {
            index,
            elapsed,
            convergence,
            camera: CameraUniform::new(rig.view_proj(), rig.view(), rig.world_position(), viewport),
            screen: CameraUniform::screen(viewport),
            passes,
        }
    }
}

/// Builds a pass for `scene`, collecting the targets its materials sample.
pub(crate) fn scene_pass(
    assembly: &SceneAssembly,
    id: PassId,
    scene: SceneId,
    output: PassOutput,
    clear: Color,
) -> Pass {
    let scene = assembly.scene(scene);
    let mut reads: Vec<RenderTargetHandle> = Vec::new();
    for drawable in &scene.drawables {
        for binding in assembly.materials.get(drawable.material).textures() {
            if let TextureSource::Target(handle) = binding.source {
                if !reads.contains(&handle) {
                    reads.push(handle);
                }
            }
        }
    }
    Pass {
        id,
        scene: scene.id,
        camera: scene.camera,
        output,
        clear,
        reads,
    }
}
