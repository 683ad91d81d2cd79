//! Materials: a shared program plus the current values of its uniforms.
//!
//! Each draw owns exactly one material. Uniform values are plain `Pod`
//! structs mutated in place every tick; the GPU executor uploads their bytes
//! verbatim, so every struct mirrors its WGSL counterpart field for field,
//! padding included.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::shader::{ShaderProgram, ShaderSet, UniformField, UniformType};
use crate::targets::{PipelineTargets, RenderTargetHandle, WrapMode};

use UniformType::{Mat4, Scalar, Vec2, Vec3};

/// A uniform block with a declared field list.
///
/// `FIELDS` excludes padding and must match the program's non-texture schema.
pub trait UniformBlock: Pod {
    const FIELDS: &'static [UniformField];
}

// ── uniform blocks ────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct NoiseUniforms {
    pub frequency: f32,
    pub seed: f32,
    pub _pad: [f32; 2],
}

impl UniformBlock for NoiseUniforms {
    const FIELDS: &'static [UniformField] = &[
        UniformField::new("uFrequency", Scalar),
        UniformField::new("uSeed", Scalar),
    ];
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct StarsUniforms {
    /// Device pixels per logical pixel, scales sprite size.
    pub pixel_ratio: f32,
    pub _pad: [f32; 3],
}

impl UniformBlock for StarsUniforms {
    const FIELDS: &'static [UniformField] = &[UniformField::new("uPixelRatio", Scalar)];
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct DiscUniforms {
    pub time: f32,
    pub _pad: [f32; 3],
}

impl UniformBlock for DiscUniforms {
    const FIELDS: &'static [UniformField] = &[UniformField::new("uTime", Scalar)];
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
}

impl Default for ModelUniforms {
    fn default() -> Self {
        Self {
            model: glam::Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl UniformBlock for ModelUniforms {
    const FIELDS: &'static [UniformField] = &[UniformField::new("uModel", Mat4)];
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct CompositionUniforms {
    /// Projected black hole center in `[0, 1]` screen space, y up.
    pub convergence: [f32; 2],
    pub time: f32,
    pub _pad: f32,
}

impl UniformBlock for CompositionUniforms {
    const FIELDS: &'static [UniformField] = &[
        UniformField::new("uConvergencePosition", Vec2),
        UniformField::new("uTime", Scalar),
    ];
}

/// WGSL: `vec2 resolution; f32 gridSize; f32 intensity; vec3 backgroundColor;
/// f32 time; f32 contrast` padded to 48 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct DitherUniforms {
    pub resolution: [f32; 2],
    pub grid_size: f32,
    pub intensity: f32,
    pub background: [f32; 3],
    pub time: f32,
    pub contrast: f32,
    pub _pad: [f32; 3],
}

impl UniformBlock for DitherUniforms {
    const FIELDS: &'static [UniformField] = &[
        UniformField::new("resolution", Vec2),
        UniformField::new("gridSize", Scalar),
        UniformField::new("intensity", Scalar),
        UniformField::new("backgroundColor", Vec3),
        UniformField::new("time", Scalar),
        UniformField::new("contrast", Scalar),
    ];
}

// ── bindings ──────────────────────────────────────────────────────────────

/// Where a sampled texture comes from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureSource {
    Target(RenderTargetHandle),
    /// The baked disc color ramp.
    Gradient,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureBinding {
    pub name: &'static str,
    pub source: TextureSource,
    pub wrap: WrapMode,
}

impl TextureBinding {
    pub const fn target(name: &'static str, handle: RenderTargetHandle, wrap: WrapMode) -> Self {
        Self {
            name,
            source: TextureSource::Target(handle),
            wrap,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendMode {
    Opaque,
    /// Straight-alpha "over".
    Alpha,
    Additive,
    /// Per-channel maximum, for accumulating masks.
    Max,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("uniform block for `{program}` declares {found:?}, program expects {expected:?}")]
    UniformMismatch {
        program: &'static str,
        expected: Vec<&'static str>,
        found: Vec<&'static str>,
    },

    #[error("textures for `{program}` are {found:?}, program expects {expected:?}")]
    TextureMismatch {
        program: &'static str,
        expected: Vec<&'static str>,
        found: Vec<&'static str>,
    },
}

/// Program binding plus uniform values for one draw.
#[derive(Debug)]
pub struct Material<U: UniformBlock> {
    program: Arc<ShaderProgram>,
    pub uniforms: U,
    textures: Vec<TextureBinding>,
    blend: BlendMode,
}

impl<U: UniformBlock> Material<U> {
    /// Binds `uniforms` and `textures` to `program`, checking both against its schema.
    pub fn new(
        program: Arc<ShaderProgram>,
        uniforms: U,
        textures: Vec<TextureBinding>,
        blend: BlendMode,
    ) -> Result<Self, MaterialError> {
        let values_match = U::FIELDS.len() == program.value_fields().count()
            && U::FIELDS.iter().zip(program.value_fields()).all(|(a, b)| a == b);
        if !values_match {
            return Err(MaterialError::UniformMismatch {
                program: program.label(),
                expected: program.value_fields().map(|f| f.name).collect(),
                found: U::FIELDS.iter().map(|f| f.name).collect(),
            });
        }

        let expected: Vec<&'static str> = program.texture_fields().map(|f| f.name).collect();
        let found: Vec<&'static str> = textures.iter().map(|t| t.name).collect();
        if expected != found {
            return Err(MaterialError::TextureMismatch {
                program: program.label(),
                expected,
                found,
            });
        }

        Ok(Self {
            program,
            uniforms,
            textures,
            blend,
        })
    }
}

/// Type-erased view of a material, as the executor sees it.
pub trait MaterialBinding {
    fn program(&self) -> &ShaderProgram;
    fn uniform_bytes(&self) -> &[u8];
    fn textures(&self) -> &[TextureBinding];
    fn blend(&self) -> BlendMode;
}

impl<U: UniformBlock> MaterialBinding for Material<U> {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    fn blend(&self) -> BlendMode {
        self.blend
    }
}

// ── material set ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MaterialId {
    Noise,
    Stars,
    Disc,
    Hole,
    LensDisc,
    Composition,
    Dither,
}

impl MaterialId {
    pub const ALL: [Self; 7] = [
        Self::Noise,
        Self::Stars,
        Self::Disc,
        Self::Hole,
        Self::LensDisc,
        Self::Composition,
        Self::Dither,
    ];
}

/// One material per draw of the pipeline.
#[derive(Debug)]
pub struct Materials {
    pub noise: Material<NoiseUniforms>,
    pub stars: Material<StarsUniforms>,
    pub disc: Material<DiscUniforms>,
    pub hole: Material<ModelUniforms>,
    pub lens_disc: Material<ModelUniforms>,
    pub composition: Material<CompositionUniforms>,
    pub dither: Material<DitherUniforms>,
}

impl Materials {
    pub fn new(shaders: &ShaderSet, targets: PipelineTargets) -> Result<Self, MaterialError> {
        let clamp = WrapMode::Clamp;
        Ok(Self {
            noise: Material::new(
                shaders.noises.clone(),
                NoiseUniforms {
                    frequency: 1.0,
                    ..Default::default()
                },
                Vec::new(),
                BlendMode::Opaque,
            )?,
            stars: Material::new(
                shaders.stars.clone(),
                StarsUniforms {
                    pixel_ratio: 1.0,
                    ..Default::default()
                },
                Vec::new(),
                BlendMode::Additive,
            )?,
            disc: Material::new(
                shaders.disc.clone(),
                DiscUniforms::default(),
                vec![
                    TextureBinding {
                        name: "uGradientTexture",
                        source: TextureSource::Gradient,
                        wrap: clamp,
                    },
                    TextureBinding::target("uNoisesTexture", targets.noise, WrapMode::Repeat),
                ],
                BlendMode::Alpha,
            )?,
            hole: Material::new(
                shaders.distortion_hole.clone(),
                ModelUniforms::default(),
                Vec::new(),
                BlendMode::Max,
            )?,
            lens_disc: Material::new(
                shaders.distortion_disc.clone(),
                ModelUniforms::default(),
                Vec::new(),
                BlendMode::Max,
            )?,
            composition: Material::new(
                shaders.composition.clone(),
                CompositionUniforms::default(),
                vec![
                    TextureBinding::target("uDefaultTexture", targets.pre_distortion, clamp),
                    TextureBinding::target("uDistortionTexture", targets.distortion_mask, clamp),
                ],
                BlendMode::Opaque,
            )?,
            dither: Material::new(
                shaders.dither.clone(),
                DitherUniforms::default(),
                vec![TextureBinding::target("tDiffuse", targets.composed, clamp)],
                BlendMode::Opaque,
            )?,
        })
    }

    pub fn get(&self, id: MaterialId) -> &dyn MaterialBinding {
        match id {
            MaterialId::Noise => &self.noise,
            MaterialId::Stars => &self.stars,
            MaterialId::Disc => &self.disc,
            MaterialId::Hole => &self.hole,
            MaterialId::LensDisc => &self.lens_disc,
            MaterialId::Composition => &self.composition,
            MaterialId::Dither => &self.dither,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StageSources;
    use crate::shader::{DITHER_SCHEMA, MODEL_SCHEMA};
    use crate::targets::{NullAllocator, RenderTargetRegistry, TargetKind};

    fn program(schema: &'static [UniformField]) -> Arc<ShaderProgram> {
        Arc::new(ShaderProgram::new(
            "test",
            StageSources {
                vertex: String::new(),
                fragment: String::new(),
            },
            schema,
        ))
    }

    #[test]
    fn uniform_structs_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<DitherUniforms>(), 48);
        assert_eq!(std::mem::size_of::<CompositionUniforms>(), 16);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 64);
        assert_eq!(std::mem::size_of::<NoiseUniforms>(), 16);
    }

    #[test]
    fn mismatched_uniform_block_is_rejected() {
        let err = Material::new(
            program(DITHER_SCHEMA),
            ModelUniforms::default(),
            Vec::new(),
            BlendMode::Opaque,
        )
        .unwrap_err();
        assert!(matches!(err, MaterialError::UniformMismatch { .. }));
    }

    #[test]
    fn missing_texture_is_rejected() {
        let err = Material::new(
            program(DITHER_SCHEMA),
            DitherUniforms::default(),
            Vec::new(),
            BlendMode::Opaque,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MaterialError::TextureMismatch {
                program: "test",
                expected: vec!["tDiffuse"],
                found: vec![],
            }
        );
    }

    #[test]
    fn uniform_bytes_reflect_in_place_updates() {
        let mut reg = RenderTargetRegistry::new(NullAllocator::default());
        let composed = reg.allocate(TargetKind::Composed, 8, 8).unwrap();
        let mut material = Material::new(
            program(DITHER_SCHEMA),
            DitherUniforms::default(),
            vec![TextureBinding::target("tDiffuse", composed, WrapMode::Clamp)],
            BlendMode::Opaque,
        )
        .unwrap();

        material.uniforms.grid_size = 5.0;
        let bytes = material.uniform_bytes();
        let grid_size = f32::from_ne_bytes(bytes[8..12].try_into().unwrap());
        assert_eq!(grid_size, 5.0);
        assert_eq!(material.textures()[0].source, TextureSource::Target(composed));
    }

    #[test]
    fn model_programs_share_schema() {
        let hole = Material::new(
            program(MODEL_SCHEMA),
            ModelUniforms::default(),
            Vec::new(),
            BlendMode::Max,
        )
        .unwrap();
        assert_eq!(hole.blend(), BlendMode::Max);
        assert_eq!(hole.program().schema(), MODEL_SCHEMA);
    }
}
