/// What the frame loop does after the surface refused to hand out a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated; the surface was configured again.
    Reconfigured,
    /// Timeout and similar hiccups. Only this frame is dropped.
    SkipFrame,
    /// Out of memory. The run ends.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn is_fatal(self) -> bool {
        self == Self::Fatal
    }
}
