//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the
//! application: lifecycle hooks, the per-frame context, and the start-up
//! context handed out once the GPU exists.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, StartCtx, WindowCtx};
