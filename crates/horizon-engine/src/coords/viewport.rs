/// Viewport size in logical pixels together with the window scale factor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,

    /// Physical pixels per logical pixel, as reported by the platform.
    pub scale_factor: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Builds a viewport from a physical drawable size.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            width: (width as f64 / scale) as f32,
            height: (height as f64 / scale) as f32,
            scale_factor: scale as f32,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && self.scale_factor > 0.0
    }

    /// Width over height. Only meaningful when [`is_valid`](Self::is_valid).
    #[inline]
    pub fn aspect(self) -> f32 {
        self.width / self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_physical_divides_by_scale() {
        let v = Viewport::from_physical(1600, 1200, 2.0);
        assert_eq!(v, Viewport::new(800.0, 600.0, 2.0));
        assert!((v.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn bogus_scale_falls_back_to_one() {
        let v = Viewport::from_physical(640, 480, 0.0);
        assert_eq!(v.scale_factor, 1.0);
        assert_eq!(v.width, 640.0);
    }

    #[test]
    fn zero_area_is_invalid() {
        assert!(!Viewport::new(0.0, 10.0, 1.0).is_valid());
        assert!(!Viewport::default().is_valid());
        assert!(Viewport::new(1.0, 1.0, 1.0).is_valid());
    }
}
