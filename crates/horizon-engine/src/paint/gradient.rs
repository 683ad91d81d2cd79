use super::Color;

/// A single gradient stop at offset `t` in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub t: f32,
    pub color: Color,
}

impl ColorStop {
    #[inline]
    pub const fn new(t: f32, color: Color) -> Self {
        Self { t, color }
    }
}

/// One-dimensional color ramp.
///
/// Stops are kept sorted by offset. Outside the first/last stop the edge color
/// is held (pad spread), matching a canvas linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.retain(|s| s.t.is_finite());
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Samples the ramp at `t`. An empty gradient is transparent black.
    pub fn sample(&self, t: f32) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::default();
        };
        if t <= first.t {
            return first.color;
        }
        if t >= last.t {
            return last.color;
        }

        let upper = self.stops.partition_point(|s| s.t <= t);
        let a = self.stops[upper - 1];
        let b = self.stops[upper];
        let span = b.t - a.t;
        if span <= f32::EPSILON {
            return b.color;
        }
        a.color.lerp(b.color, (t - a.t) / span)
    }

    /// Rasterizes `texels` RGBA8 samples along the ramp, sampling texel centers.
    pub fn bake_rgba8(&self, texels: u32) -> Vec<u8> {
        let n = texels.max(1);
        (0..n)
            .flat_map(|i| self.sample((i as f32 + 0.5) / n as f32).to_rgba8())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Gradient {
        Gradient::new(vec![
            ColorStop::new(1.0, Color::rgb(0.0, 0.0, 1.0)),
            ColorStop::new(0.0, Color::rgb(1.0, 0.0, 0.0)),
            ColorStop::new(0.5, Color::rgb(0.0, 1.0, 0.0)),
        ])
    }

    #[test]
    fn stops_are_sorted() {
        let g = ramp();
        let ts: Vec<f32> = g.stops().iter().map(|s| s.t).collect();
        assert_eq!(ts, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn sample_interpolates_between_neighbours() {
        let c = ramp().sample(0.25);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn sample_pads_outside_range() {
        let g = Gradient::new(vec![
            ColorStop::new(0.2, Color::rgb(1.0, 1.0, 1.0)),
            ColorStop::new(0.8, Color::BLACK),
        ]);
        assert_eq!(g.sample(0.0), Color::rgb(1.0, 1.0, 1.0));
        assert_eq!(g.sample(1.0), Color::BLACK);
    }

    #[test]
    fn bake_emits_four_bytes_per_texel() {
        let bytes = ramp().bake_rgba8(128);
        assert_eq!(bytes.len(), 128 * 4);
        // First texel is near pure red, last near pure blue.
        assert!(bytes[0] > 240 && bytes[2] < 10);
        assert!(bytes[127 * 4 + 2] > 240);
    }

    #[test]
    fn empty_gradient_is_transparent() {
        assert_eq!(Gradient::new(Vec::new()).sample(0.5), Color::default());
    }
}
