//! A frame: the complete, GPU-free description of one tick's work.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use horizon_engine::paint::Color;
use thiserror::Error;

use crate::camera::ConvergencePoint;
use crate::scene::{SceneCamera, SceneId};
use crate::targets::RenderTargetHandle;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PassId {
    NoiseBake,
    World,
    Distortion,
    Composition,
    Dither,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassOutput {
    Target(RenderTargetHandle),
    /// The visible surface.
    Surface,
}

/// One render of a scene into an output.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub id: PassId,
    pub scene: SceneId,
    pub camera: SceneCamera,
    pub output: PassOutput,
    pub clear: Color,
    /// Targets sampled by the scene's materials.
    pub reads: Vec<RenderTargetHandle>,
}

/// Camera block bound at group 0 of every pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// World-space eye position, w = 1.
    pub position: [f32; 4],
    /// Device width, device height, pixel ratio, unused.
    pub viewport: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, view: Mat4, position: Vec3, viewport: [f32; 4]) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            position: position.extend(1.0).to_array(),
            viewport,
        }
    }

    /// Identity transforms, for scenes already in clip space.
    pub fn screen(viewport: [f32; 4]) -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, viewport)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderingViolation {
    #[error("pass {pass:?} samples target {target:?} it also writes")]
    ReadsOwnOutput {
        pass: PassId,
        target: RenderTargetHandle,
    },

    #[error("pass {pass:?} samples target {target:?} before {writer:?} writes it")]
    ReadBeforeWrite {
        pass: PassId,
        target: RenderTargetHandle,
        writer: PassId,
    },
}

/// Everything the executor needs to submit one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub elapsed: f32,
    pub convergence: ConvergencePoint,
    /// Camera block for [`SceneCamera::Rig`] passes.
    pub camera: CameraUniform,
    /// Camera block for [`SceneCamera::Screen`] passes.
    pub screen: CameraUniform,
    /// Execution order.
    pub passes: Vec<Pass>,
}

impl Frame {
    pub fn pass(&self, id: PassId) -> Option<&Pass> {
        self.passes.iter().find(|p| p.id == id)
    }

    pub fn position(&self, id: PassId) -> Option<usize> {
        self.passes.iter().position(|p| p.id == id)
    }

    pub fn camera_for(&self, camera: SceneCamera) -> &CameraUniform {
        match camera {
            SceneCamera::Rig => &self.camera,
            SceneCamera::Screen => &self.screen,
        }
    }

    /// Checks that no pass samples a target that it, or a later pass, writes.
    ///
    /// Targets written by no pass of this frame (the noise bake) may be read
    /// freely.
    pub fn check_ordering(&self) -> Result<(), OrderingViolation> {
        for (i, pass) in self.passes.iter().enumerate() {
            for &target in &pass.reads {
                if pass.output == PassOutput::Target(target) {
                    return Err(OrderingViolation::ReadsOwnOutput {
                        pass: pass.id,
                        target,
                    });
                }
                if let Some(writer) = self.passes[i + 1..]
                    .iter()
                    .find(|p| p.output == PassOutput::Target(target))
                {
                    return Err(OrderingViolation::ReadBeforeWrite {
                        pass: pass.id,
                        target,
                        writer: writer.id,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{NullAllocator, RenderTargetRegistry, TargetKind};

    fn pass(id: PassId, output: PassOutput, reads: Vec<RenderTargetHandle>) -> Pass {
        Pass {
            id,
            scene: SceneId::World,
            camera: SceneCamera::Rig,
            output,
            clear: Color::BLACK,
            reads,
        }
    }

    fn frame(passes: Vec<Pass>) -> Frame {
        Frame {
            index: 0,
            elapsed: 0.0,
            convergence: ConvergencePoint(glam::Vec2::splat(0.5)),
            camera: CameraUniform::screen([1.0, 1.0, 1.0, 0.0]),
            screen: CameraUniform::screen([1.0, 1.0, 1.0, 0.0]),
            passes,
        }
    }

    #[test]
    fn camera_uniform_is_160_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 160);
    }

    #[test]
    fn ordering_rules() {
        let mut reg = RenderTargetRegistry::new(NullAllocator::default());
        let a = reg.allocate(TargetKind::PreDistortion, 4, 4).unwrap();
        let b = reg.allocate(TargetKind::Composed, 4, 4).unwrap();
        let baked = reg.allocate(TargetKind::NoiseBake, 4, 4).unwrap();

        let good = frame(vec![
            pass(PassId::World, PassOutput::Target(a), vec![baked]),
            pass(PassId::Composition, PassOutput::Target(b), vec![a]),
            pass(PassId::Dither, PassOutput::Surface, vec![b]),
        ]);
        assert_eq!(good.check_ordering(), Ok(()));
        assert_eq!(good.position(PassId::Dither), Some(2));

        let swapped = frame(vec![
            pass(PassId::Composition, PassOutput::Target(b), vec![a]),
            pass(PassId::World, PassOutput::Target(a), vec![]),
        ]);
        assert_eq!(
            swapped.check_ordering(),
            Err(OrderingViolation::ReadBeforeWrite {
                pass: PassId::Composition,
                target: a,
                writer: PassId::World,
            })
        );

        let feedback = frame(vec![pass(PassId::World, PassOutput::Target(a), vec![a])]);
        assert!(matches!(
            feedback.check_ordering(),
            Err(OrderingViolation::ReadsOwnOutput { .. })
        ));
    }
}
