//! Renderer-facing handles.
//!
//! The runtime owns the device and the acquired surface frame. A draw callback
//! gets a [`RenderCtx`] describing the frame and a [`RenderTarget`] to record
//! into, both valid for that frame only.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
