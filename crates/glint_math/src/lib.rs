// Re-export glam for convenience
pub use glam::*;

// Glint math types
mod aabb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use ray::Ray;
pub use transform::{Mat4Ext, OPENGL_TO_WGPU_MATRIX};

/// Distance reported for a ray that hits nothing.
///
/// Every analytic intersection routine returns exactly this value on a miss,
/// so callers can compare with `<` instead of juggling `Option`s.
pub const MISS: f32 = f32::MAX;

/// Returns true if `t` is a real hit (anything other than [`MISS`]).
#[inline]
pub fn is_hit(t: f32) -> bool {
    t < MISS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
    }

    #[test]
    fn test_is_hit() {
        assert!(is_hit(1.75));
        assert!(!is_hit(MISS));
    }
}
