//! Horizon engine crate.
//!
//! Owns the platform + GPU runtime pieces: the wgpu device and surface, the
//! winit loop driving a single visualization window, input translation, frame
//! timing and logger setup. The render pipeline lives in `horizon-pipeline`.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
