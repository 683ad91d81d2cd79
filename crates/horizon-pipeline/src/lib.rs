//! Horizon render pipeline.
//!
//! A fixed sequence of passes renders a star field and accretion disc into an
//! off-screen color target, a lensing mask into a second target, composes the
//! two around the projected black hole, and dithers the result onto the
//! visible surface.
//!
//! All scheduling logic is GPU-free: [`scheduler::FrameScheduler::tick`]
//! produces a [`frame::Frame`] value, and a [`lifecycle::PassExecutor`] (the
//! wgpu one lives in [`gpu`]) turns it into submissions.

pub mod assets;
pub mod camera;
pub mod config;
pub mod frame;
pub mod gpu;
pub mod lifecycle;
pub mod material;
pub mod noise;
pub mod params;
pub mod resize;
pub mod scene;
pub mod scheduler;
pub mod shader;
pub mod targets;

pub use config::PipelineConfig;
pub use lifecycle::{LivenessFlag, PassExecutor, Pipeline, TickError, TickOutcome};
pub use params::{ParameterDefaults, ParameterSnapshot, ParameterStore};
