// Transform utilities for Mat4
//
// Extends glam::Mat4 with the homogeneous helpers needed for unprojecting
// screen positions into world space.

use glam::{Mat4, Vec3, Vec4};

/// Remaps OpenGL clip space (z in [-w, w]) to wgpu clip space (z in [0, w]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Multiply a homogeneous point and divide by the resulting w.
    fn project_homogeneous(&self, point: Vec4) -> Vec3;

    /// Unproject a normalized device coordinate on the z = 0 plane.
    ///
    /// `self` is expected to be an inverse view-projection matrix.
    fn unproject_ndc(&self, x: f32, y: f32) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn project_homogeneous(&self, point: Vec4) -> Vec3 {
        let p = *self * point;
        p.truncate() / p.w
    }

    fn unproject_ndc(&self, x: f32, y: f32) -> Vec3 {
        self.project_homogeneous(Vec4::new(x, y, 0.0, 1.0))
    }
}
