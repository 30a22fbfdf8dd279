use crate::Vec3;

/// A ray in 3D space with an origin and a direction.
///
/// The direction is not required to be normalized. Camera rays are built from
/// unprojected corner points, so `t` is measured in multiples of `direction`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersect the ray with the plane `normal · p = distance`.
    ///
    /// Returns the ray parameter of the crossing. A ray parallel to the plane
    /// yields a non-finite value, which callers must check.
    pub fn plane_parameter(&self, normal: Vec3, distance: f32) -> f32 {
        (distance - normal.dot(self.origin)) / normal.dot(self.direction)
    }
}
