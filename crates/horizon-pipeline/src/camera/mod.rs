//! Camera Rig.
//!
//! A perspective camera steered by orbit controls, wrapped in a parent
//! transform that adds idle jitter and a continuously accumulating roll.

mod orbit;
mod perspective;
mod projection;
mod rig;

pub use orbit::OrbitControls;
pub use perspective::PerspectiveCamera;
pub use projection::{project_to_screen, ConvergencePoint};
pub use rig::{billboard_towards, jitter_offset, CameraRig};
