use crate::coords::Viewport;
use crate::time::FrameTime;

/// What a draw callback knows about the frame being recorded.
///
/// Device and queue are not included; renderers keep their own handles from
/// start-up.
#[derive(Debug, Copy, Clone)]
pub struct RenderCtx {
    pub surface_format: wgpu::TextureFormat,
    /// Configured surface extent in physical pixels. Never zero.
    pub surface_size: (u32, u32),
    pub viewport: Viewport,
    pub time: FrameTime,
}

/// The acquired surface frame: encoder plus the view passes draw into.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}
