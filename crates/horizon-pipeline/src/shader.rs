//! Shader programs and their declared uniform schemas.
//!
//! A [`ShaderProgram`] is immutable once built and shared through `Arc`
//! between every material that uses it.

use std::sync::Arc;

use crate::assets::{ShaderSources, StageSources};

/// Semantic type of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformType {
    Scalar,
    Vec2,
    Vec3,
    Mat4,
    Texture,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformField {
    pub name: &'static str,
    pub ty: UniformType,
}

impl UniformField {
    pub const fn new(name: &'static str, ty: UniformType) -> Self {
        Self { name, ty }
    }
}

use UniformType::{Mat4, Scalar, Texture, Vec2, Vec3};

pub const NOISES_SCHEMA: &[UniformField] = &[
    UniformField::new("uFrequency", Scalar),
    UniformField::new("uSeed", Scalar),
];

pub const STARS_SCHEMA: &[UniformField] = &[UniformField::new("uPixelRatio", Scalar)];

pub const DISC_SCHEMA: &[UniformField] = &[
    UniformField::new("uTime", Scalar),
    UniformField::new("uGradientTexture", Texture),
    UniformField::new("uNoisesTexture", Texture),
];

/// Shared by the hole and lens-disc programs.
pub const MODEL_SCHEMA: &[UniformField] = &[UniformField::new("uModel", Mat4)];

pub const COMPOSITION_SCHEMA: &[UniformField] = &[
    UniformField::new("uConvergencePosition", Vec2),
    UniformField::new("uTime", Scalar),
    UniformField::new("uDefaultTexture", Texture),
    UniformField::new("uDistortionTexture", Texture),
];

pub const DITHER_SCHEMA: &[UniformField] = &[
    UniformField::new("resolution", Vec2),
    UniformField::new("gridSize", Scalar),
    UniformField::new("intensity", Scalar),
    UniformField::new("backgroundColor", Vec3),
    UniformField::new("time", Scalar),
    UniformField::new("contrast", Scalar),
    UniformField::new("tDiffuse", Texture),
];

/// Vertex + fragment source with the uniforms the pair expects.
#[derive(Debug)]
pub struct ShaderProgram {
    label: &'static str,
    vertex: String,
    fragment: String,
    schema: &'static [UniformField],
}

impl ShaderProgram {
    pub fn new(label: &'static str, stages: StageSources, schema: &'static [UniformField]) -> Self {
        Self {
            label,
            vertex: stages.vertex,
            fragment: stages.fragment,
            schema,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn schema(&self) -> &'static [UniformField] {
        self.schema
    }

    /// Non-texture uniforms in declaration order (the uniform block layout).
    pub fn value_fields(&self) -> impl Iterator<Item = &'static UniformField> {
        self.schema.iter().filter(|f| f.ty != UniformType::Texture)
    }

    /// Texture uniforms in binding order.
    pub fn texture_fields(&self) -> impl Iterator<Item = &'static UniformField> {
        self.schema.iter().filter(|f| f.ty == UniformType::Texture)
    }
}

/// Every program of the pipeline.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub noises: Arc<ShaderProgram>,
    pub stars: Arc<ShaderProgram>,
    pub disc: Arc<ShaderProgram>,
    pub distortion_hole: Arc<ShaderProgram>,
    pub distortion_disc: Arc<ShaderProgram>,
    pub composition: Arc<ShaderProgram>,
    pub dither: Arc<ShaderProgram>,
}

impl ShaderSet {
    pub fn from_sources(sources: ShaderSources) -> Self {
        let program = |label, stages, schema| Arc::new(ShaderProgram::new(label, stages, schema));
        Self {
            noises: program("noises", sources.noises, NOISES_SCHEMA),
            stars: program("stars", sources.stars, STARS_SCHEMA),
            disc: program("disc", sources.disc, DISC_SCHEMA),
            distortion_hole: program("distortion hole", sources.distortion_hole, MODEL_SCHEMA),
            distortion_disc: program("distortion disc", sources.distortion_disc, MODEL_SCHEMA),
            composition: program("composition", sources.composition, COMPOSITION_SCHEMA),
            dither: program("dither", sources.dither, DITHER_SCHEMA),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_fields_keep_declaration_order() {
        let program = ShaderProgram::new(
            "composition",
            StageSources {
                vertex: String::new(),
                fragment: String::new(),
            },
            COMPOSITION_SCHEMA,
        );
        let textures: Vec<_> = program.texture_fields().map(|f| f.name).collect();
        assert_eq!(textures, ["uDefaultTexture", "uDistortionTexture"]);
        let values: Vec<_> = program.value_fields().map(|f| f.name).collect();
        assert_eq!(values, ["uConvergencePosition", "uTime"]);
    }
}
