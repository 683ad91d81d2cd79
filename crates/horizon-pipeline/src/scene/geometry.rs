use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// `width` x `height` quad centered on the origin in the XY plane, facing +Z.
/// uv (0, 0) is the bottom-left corner.
pub fn plane(width: f32, height: f32) -> Mesh {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let v = |x: f32, y: f32, u: f32, w: f32| MeshVertex {
        position: [x, y, 0.0],
        uv: [u, w],
    };
    Mesh {
        vertices: vec![
            v(-hw, -hh, 0.0, 0.0),
            v(hw, -hh, 1.0, 0.0),
            v(hw, hh, 1.0, 1.0),
            v(-hw, hh, 0.0, 1.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Flat ring in the XZ plane.
///
/// `u` runs around the ring, `v` is 1 at the inner edge and 0 at the outer one.
pub fn annulus(inner: f32, outer: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(1);
    let mut mesh = Mesh::default();

    for j in 0..=rings {
        let v = j as f32 / rings as f32;
        let radius = inner + (outer - inner) * v;
        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let theta = u * TAU;
            mesh.vertices.push(MeshVertex {
                position: [radius * theta.sin(), 0.0, radius * theta.cos()],
                uv: [u, 1.0 - v],
            });
        }
    }

    let row = segments + 1;
    for j in 0..rings {
        for i in 0..segments {
            let a = j * row + i;
            let b = (j + 1) * row + i;
            let c = b + 1;
            let d = a + 1;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_spans_requested_size() {
        let m = plane(4.0, 2.0);
        assert_eq!(m.vertices[0].position, [-2.0, -1.0, 0.0]);
        assert_eq!(m.vertices[2].position, [2.0, 1.0, 0.0]);
        assert_eq!(m.indices.len(), 6);
    }

    #[test]
    fn annulus_edges_carry_inverted_v() {
        let m = annulus(1.5, 6.0, 64, 8);
        assert_eq!(m.vertices.len(), 65 * 9);
        assert_eq!(m.indices.len(), 64 * 8 * 6);

        let radius = |v: &MeshVertex| (v.position[0].powi(2) + v.position[2].powi(2)).sqrt();
        let inner = &m.vertices[0];
        let outer = &m.vertices[m.vertices.len() - 1];
        assert!((radius(inner) - 1.5).abs() < 1e-5);
        assert_eq!(inner.uv[1], 1.0);
        assert!((radius(outer) - 6.0).abs() < 1e-5);
        assert_eq!(outer.uv[1], 0.0);
        assert!(m.vertices.iter().all(|v| v.position[1] == 0.0));
        assert!(m.indices.iter().all(|&i| (i as usize) < m.vertices.len()));
    }
}
