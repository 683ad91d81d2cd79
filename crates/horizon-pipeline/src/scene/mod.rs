//! Scene Assembly.
//!
//! The pipeline renders five fixed scenes. Each is an ordered list of draws,
//! a draw being one geometry bound to one material, plus the camera the scene
//! is viewed through.

mod assembly;
pub mod geometry;
pub mod stars;

pub use assembly::{SceneAssembly, SceneGeometry, DISC_GRADIENT_TEXELS};
pub use geometry::{Mesh, MeshVertex};
pub use stars::StarInstance;

use crate::material::MaterialId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SceneId {
    /// Stars and accretion disc.
    World,
    /// Hole and lens disc written as a lensing mask.
    Distortion,
    Composition,
    Dither,
    /// Procedural noise baked once at start-up.
    Noise,
}

/// Camera a scene is viewed through.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneCamera {
    /// The camera rig.
    Rig,
    /// Fixed full-screen projection; vertices are already in clip space.
    Screen,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GeometryId {
    /// 2x2 quad covering clip space.
    ScreenQuad,
    /// Instanced camera-facing sprites.
    Stars,
    Disc,
    HolePlane,
    LensPlane,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Drawable {
    pub geometry: GeometryId,
    pub material: MaterialId,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub id: SceneId,
    pub camera: SceneCamera,
    /// Draw order.
    pub drawables: Vec<Drawable>,
}
