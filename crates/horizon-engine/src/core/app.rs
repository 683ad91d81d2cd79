use winit::event::WindowEvent;

use crate::coords::Viewport;

use super::ctx::{FrameCtx, StartCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Call order: `on_start` once after the GPU is ready, then any number of
/// `on_resize` / `on_window_event` / `on_frame`, then `on_shutdown` exactly
/// once before the surface is destroyed.
pub trait App {
    /// Called once the window and GPU context exist. An error aborts the run.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()>;

    /// Called for raw window events, after input translation.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called when the drawable size or scale factor changes. The surface has
    /// already been reconfigured.
    fn on_resize(&mut self, viewport: Viewport) {
        let _ = viewport;
    }

    /// Called for each redraw the app requested through
    /// [`FrameCtx::request_redraw`] (or the initial one).
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the window and GPU context are dropped.
    fn on_shutdown(&mut self) {}
}
