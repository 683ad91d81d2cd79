//! Noise Bake.
//!
//! Renders the procedural noise quad into the fixed-size noise target once,
//! before the first tick. The disc samples the result for the rest of the run.

use horizon_engine::paint::Color;

use crate::camera::ConvergencePoint;
use crate::frame::{CameraUniform, Frame, PassId, PassOutput};
use crate::scene::{SceneAssembly, SceneId};
use crate::scheduler::scene_pass;
use crate::targets::RenderTargetHandle;

#[derive(Debug)]
pub struct NoiseBake {
    target: RenderTargetHandle,
    size: u32,
    runs: u32,
}

impl NoiseBake {
    pub fn new(target: RenderTargetHandle, size: u32) -> Self {
        Self {
            target,
            size,
            runs: 0,
        }
    }

    /// Number of bake frames produced so far (0 or 1).
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Returns the bake frame the first time, `None` afterwards.
    pub fn frame(&mut self, assembly: &SceneAssembly) -> Option<Frame> {
        if self.runs > 0 {
            return None;
        }
        self.runs += 1;

        let size = self.size as f32;
        let viewport = [size, size, 1.0, 0.0];
        Some(Frame {
            index: 0,
            elapsed: 0.0,
            convergence: ConvergencePoint(glam::Vec2::splat(0.5)),
            camera: CameraUniform::screen(viewport),
            screen: CameraUniform::screen(viewport),
            passes: vec![scene_pass(
                assembly,
                PassId::NoiseBake,
                SceneId::Noise,
                PassOutput::Target(self.target),
                Color::BLACK,
            )],
        })
    }
}
