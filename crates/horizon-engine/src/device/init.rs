/// What to ask wgpu for when the window's GPU context is created.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB surface format if the surface offers one.
    ///
    /// The dither pass writes display-referred colour, so the viewer turns
    /// this off to avoid a second encode.
    pub prefer_srgb: bool,

    /// FIFO ties presentation to the display refresh, which paces the ticks.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode; an unsupported one falls back to the first the
    /// surface reports.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Adapter selection hint. Four full-screen passes a frame favour the
    /// discrete GPU.
    pub power_preference: wgpu::PowerPreference,

    pub required_features: wgpu::Features,

    /// Baseline limits. Texture dimensions are raised to what the adapter
    /// supports, see [`GpuInit::device_limits`].
    pub required_limits: wgpu::Limits,

    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Limits to request from an adapter that supports `adapter`.
    ///
    /// Render targets follow the window, so the 2D texture limit is taken from
    /// the adapter instead of the conservative default. Every other limit
    /// stays at `required_limits`.
    pub fn device_limits(&self, adapter: wgpu::Limits) -> wgpu::Limits {
        self.required_limits.clone().using_resolution(adapter)
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
