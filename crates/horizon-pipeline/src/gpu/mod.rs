//! wgpu execution of frames.
//!
//! [`GpuTargetAllocator`] backs the Render Target Registry with textures;
//! [`GpuRenderer`] owns pipelines, buffers and bind groups and records the
//! passes of a [`Frame`](crate::frame::Frame) into a command encoder.

mod allocator;
mod renderer;

pub use allocator::{texture_format, GpuTarget, GpuTargetAllocator};
pub use renderer::{GpuPassExecutor, GpuRenderer};
