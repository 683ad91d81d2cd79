//! Color model and color ramps.

pub mod color;
pub mod gradient;

pub use color::Color;
pub use gradient::{ColorStop, Gradient};
