use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::device::Gpu;
use crate::input::{InputFrame, InputState};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Current viewport (logical size + scale factor).
    pub fn viewport(&self) -> Viewport {
        let phys = self.window.inner_size();
        Viewport::from_physical(phys.width, phys.height, self.window.scale_factor())
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Context passed once to `App::on_start`.
pub struct StartCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu<'w>,
    pub runtime: &'a mut RuntimeCtx,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Schedules another `on_frame` on the next display refresh.
    pub fn request_redraw(&mut self) {
        self.runtime.request_redraw();
    }

    /// Acquires the surface, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then submits and presents.
    ///
    /// Surface errors are mapped through [`Gpu::handle_surface_error`]; only a
    /// fatal one ends the run. If `draw` fails the frame is logged and
    /// discarded without presenting.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx, &mut RenderTarget<'_>) -> anyhow::Result<()>,
    {
        let viewport = self.window.viewport();

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return if self.gpu.handle_surface_error(err).is_fatal() {
                    AppControl::Exit
                } else {
                    AppControl::Continue
                };
            }
        };

        let rctx = RenderCtx {
            surface_format: self.gpu.surface_format(),
            surface_size: self.gpu.surface_size(),
            viewport,
            time: self.time,
        };

        // RenderTarget borrows frame.encoder; dropped before present() takes frame.
        let drawn = {
            let mut target = RenderTarget {
                encoder: &mut frame.encoder,
                color_view: &frame.view,
            };
            draw(&rctx, &mut target)
        };

        if let Err(e) = drawn {
            log::warn!("frame {} discarded: {e:#}", self.time.frame_index);
            return AppControl::Continue;
        }

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}
