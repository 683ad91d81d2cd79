use std::f32::consts::FRAC_PI_2;

use glam::Mat4;
use horizon_engine::paint::{Color, ColorStop, Gradient};

use crate::config::PipelineConfig;
use crate::material::{MaterialError, MaterialId, Materials};
use crate::shader::ShaderSet;
use crate::targets::PipelineTargets;

use super::geometry::{annulus, plane, Mesh};
use super::stars::{generate_stars, StarInstance};
use super::{Drawable, GeometryId, Scene, SceneCamera, SceneId};

/// Height of the baked disc color ramp.
pub const DISC_GRADIENT_TEXELS: u32 = 128;

/// CPU-side geometry of every draw.
#[derive(Debug, Clone)]
pub struct SceneGeometry {
    pub screen_quad: Mesh,
    pub disc: Mesh,
    pub hole_plane: Mesh,
    pub lens_plane: Mesh,
    pub stars: Vec<StarInstance>,
}

impl SceneGeometry {
    pub fn mesh(&self, id: GeometryId) -> Option<&Mesh> {
        match id {
            GeometryId::ScreenQuad => Some(&self.screen_quad),
            GeometryId::Disc => Some(&self.disc),
            GeometryId::HolePlane => Some(&self.hole_plane),
            GeometryId::LensPlane => Some(&self.lens_plane),
            GeometryId::Stars => None,
        }
    }
}

/// Scenes, their geometry and materials, built once after asset load.
#[derive(Debug)]
pub struct SceneAssembly {
    pub world: Scene,
    pub distortion: Scene,
    pub composition: Scene,
    pub dither: Scene,
    pub noise: Scene,
    pub geometry: SceneGeometry,
    pub materials: Materials,
    /// Color ramp sampled by the disc, from the hot inner edge outward.
    pub disc_gradient: Gradient,
}

fn disc_gradient() -> Gradient {
    let stop = |t, hex| ColorStop::new(t, Color::from_hex(hex).unwrap_or(Color::BLACK));
    Gradient::new(vec![
        stop(0.0, "#fffbf9"),
        stop(0.1, "#ffbc68"),
        stop(0.2, "#ff5600"),
        stop(0.4, "#ff0053"),
        stop(0.8, "#cc00ff"),
    ])
}

fn scene(id: SceneId, camera: SceneCamera, draws: &[(GeometryId, MaterialId)]) -> Scene {
    Scene {
        id,
        camera,
        drawables: draws
            .iter()
            .map(|&(geometry, material)| Drawable { geometry, material })
            .collect(),
    }
}

impl SceneAssembly {
    pub fn build(
        shaders: &ShaderSet,
        targets: PipelineTargets,
        config: &PipelineConfig,
    ) -> Result<Self, MaterialError> {
        let mut materials = Materials::new(shaders, targets)?;
        materials.lens_disc.uniforms.model = Mat4::from_rotation_x(-FRAC_PI_2).to_cols_array_2d();

        let geometry = SceneGeometry {
            screen_quad: plane(2.0, 2.0),
            disc: annulus(1.5, 6.0, 64, 8),
            hole_plane: plane(4.0, 4.0),
            lens_plane: plane(12.0, 12.0),
            stars: generate_stars(config.star_count, config.star_seed),
        };
        log::debug!("generated {} stars", geometry.stars.len());

        use GeometryId as G;
        use MaterialId as M;
        Ok(Self {
            world: scene(
                SceneId::World,
                SceneCamera::Rig,
                &[(G::Stars, M::Stars), (G::Disc, M::Disc)],
            ),
            distortion: scene(
                SceneId::Distortion,
                SceneCamera::Rig,
                &[(G::HolePlane, M::Hole), (G::LensPlane, M::LensDisc)],
            ),
            composition: scene(
                SceneId::Composition,
                SceneCamera::Screen,
                &[(G::ScreenQuad, M::Composition)],
            ),
            dither: scene(
                SceneId::Dither,
                SceneCamera::Screen,
                &[(G::ScreenQuad, M::Dither)],
            ),
            noise: scene(
                SceneId::Noise,
                SceneCamera::Screen,
                &[(G::ScreenQuad, M::Noise)],
            ),
            geometry,
            materials,
            disc_gradient: disc_gradient(),
        })
    }

    pub fn scene(&self, id: SceneId) -> &Scene {
        match id {
            SceneId::World => &self.world,
            SceneId::Distortion => &self.distortion,
            SceneId::Composition => &self.composition,
            SceneId::Dither => &self.dither,
            SceneId::Noise => &self.noise,
        }
    }
}
