use crate::{Ray, Vec3, MISS};

/// Axis-Aligned Bounding Box defined by its two extreme corners.
///
/// Used both as a primitive in its own right (cubes, the light gizmo) and as
/// the selection box that drag manipulation is performed against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from its minimum and maximum corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a cube-shaped AABB centered on `center`.
    pub fn from_center(center: Vec3, half_size: f32) -> Self {
        let half = Vec3::splat(half_size);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Translate (move) the AABB by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Compute the near and far slab distances along `ray`.
    ///
    /// Per axis: `tMin = (min - origin) / dir`, `tMax = (max - origin) / dir`.
    /// The box is entered at the largest per-axis minimum and left at the
    /// smallest per-axis maximum. No intersection means `near >= far`.
    pub fn slabs(&self, ray: &Ray) -> (f32, f32) {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;

        for axis in 0..3 {
            let t_min = (self.min[axis] - ray.origin[axis]) / ray.direction[axis];
            let t_max = (self.max[axis] - ray.origin[axis]) / ray.direction[axis];
            near = near.max(t_min.min(t_max));
            far = far.min(t_min.max(t_max));
        }

        (near, far)
    }

    /// Slab-method intersection returning the entry distance.
    ///
    /// Returns [`MISS`] unless `0 < near < far`, so rays starting inside the
    /// box or pointing away from it miss.
    pub fn intersect(&self, ray: &Ray) -> f32 {
        let (near, far) = self.slabs(ray);
        if near > 0.0 && near < far {
            near
        } else {
            MISS
        }
    }

    /// Outward normal of the face containing `point`.
    ///
    /// Faces are tested in the order -X, +X, -Y, +Y, -Z; anything that matches
    /// none of them within `epsilon` is attributed to +Z.
    pub fn face_normal(&self, point: Vec3, epsilon: f32) -> Vec3 {
        if (point.x - self.min.x).abs() < epsilon {
            Vec3::NEG_X
        } else if (point.x - self.max.x).abs() < epsilon {
            Vec3::X
        } else if (point.y - self.min.y).abs() < epsilon {
            Vec3::NEG_Y
        } else if (point.y - self.max.y).abs() < epsilon {
            Vec3::Y
        } else if (point.z - self.min.z).abs() < epsilon {
            Vec3::NEG_Z
        } else {
            Vec3::Z
        }
    }

    /// The eight corners, indexed by bit pattern (bit 0 = x, bit 1 = y, bit 2 = z).
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }

    /// Vertex index pairs for the twelve edges of [`Aabb::corners`].
    pub const EDGES: [[usize; 2]; 12] = [
        [0, 1], [1, 3], [3, 2], [2, 0],
        [4, 5], [5, 7], [7, 6], [6, 4],
        [0, 4], [1, 5], [2, 6], [3, 7],
    ];
}
