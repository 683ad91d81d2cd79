//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame to
//! obtain a `FrameTime` carrying both the clamped delta and the total elapsed
//! time that drives animation uniforms.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
