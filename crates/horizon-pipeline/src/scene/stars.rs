use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radius of the sphere the stars sit on.
pub const STAR_SPHERE_RADIUS: f32 = 400.0;

/// Per-star instance data.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
    /// Sprite diameter in logical pixels.
    pub size: f32,
    pub color: [f32; 3],
}

impl StarInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// `h` in degrees, `s` and `l` in `[0, 1]`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c * 0.5;
    [r + m, g + m, b + m]
}

/// Generates `count` stars uniformly distributed over the sphere.
///
/// The same seed always yields the same field.
pub fn generate_stars(count: usize, seed: u64) -> Vec<StarInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let theta = TAU * rng.random::<f32>();
            let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
            let position = [
                theta.cos() * phi.sin() * STAR_SPHERE_RADIUS,
                theta.sin() * phi.sin() * STAR_SPHERE_RADIUS,
                phi.cos() * STAR_SPHERE_RADIUS,
            ];

            let size = 0.5 + rng.random::<f32>() * 30.0;

            let hue = (rng.random::<f32>() * 360.0).round();
            let lightness = (80.0 + rng.random::<f32>() * 20.0).round();
            let color = hsl_to_rgb(hue, 1.0, lightness / 100.0);

            StarInstance {
                position,
                size,
                color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        let close = |a: [f32; 3], b: [f32; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5);
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgb(360.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(42.0, 1.0, 1.0), [1.0, 1.0, 1.0]));
    }

    #[test]
    fn stars_lie_on_the_sphere() {
        let stars = generate_stars(500, 7);
        assert_eq!(stars.len(), 500);
        for s in &stars {
            let [x, y, z] = s.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - STAR_SPHERE_RADIUS).abs() < 0.05);
            assert!((0.5..=30.5).contains(&s.size));

            let max = s.color.iter().copied().fold(0.0, f32::max);
            let min = s.color.iter().copied().fold(1.0, f32::min);
            assert!((max - 1.0).abs() < 1e-5);
            assert!(min >= 0.59);
        }
    }

    #[test]
    fn same_seed_same_field() {
        assert_eq!(generate_stars(32, 99), generate_stars(32, 99));
        assert_ne!(generate_stars(32, 99), generate_stars(32, 100));
    }
}
