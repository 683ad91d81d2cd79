//! Coordinate types shared between the runtime and the pipeline.
//!
//! Window sizes are reported in logical pixels plus a scale factor; device
//! pixel sizes are derived from those by the pipeline.

mod viewport;

pub use viewport::Viewport;
