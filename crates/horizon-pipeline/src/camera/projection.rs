use glam::{Mat4, Vec2, Vec3};

/// World origin in normalized screen space, `[0, 1]` on both axes with y up.
///
/// Recomputed every tick from the current camera; never carried over.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConvergencePoint(pub Vec2);

impl ConvergencePoint {
    pub fn to_array(self) -> [f32; 2] {
        self.0.to_array()
    }
}

/// Projects `point` through `view_proj` and maps NDC `[-1, 1]` to `[0, 1]`.
pub fn project_to_screen(view_proj: Mat4, point: Vec3) -> ConvergencePoint {
    let ndc = view_proj.project_point3(point);
    ConvergencePoint(Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5))
}
