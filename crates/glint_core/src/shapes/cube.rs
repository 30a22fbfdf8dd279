use glint_math::{Aabb, Ray, Vec3};

use crate::renderable::{ObjectId, Renderable, UniformDecl, UniformSink};
use crate::DirtyFlags;

/// An axis-aligned box given by its two extreme corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    id: ObjectId,
    bounds: Aabb,
    temporary_translation: Vec3,
}

impl Cube {
    pub const DEFAULT_HALF_SIZE: f32 = 0.25;

    pub fn new(id: ObjectId, min_corner: Vec3, max_corner: Vec3) -> Self {
        Self {
            id,
            bounds: Aabb::new(min_corner, max_corner),
            temporary_translation: Vec3::ZERO,
        }
    }

    pub fn min_corner(&self) -> Vec3 {
        self.bounds.min
    }

    pub fn max_corner(&self) -> Vec3 {
        self.bounds.max
    }

    fn min_name(&self) -> String {
        format!("cube_min_{}", self.id)
    }

    fn max_name(&self) -> String {
        format!("cube_max_{}", self.id)
    }

    fn t_name(&self) -> String {
        format!("t_cube_{}", self.id)
    }
}

impl Renderable for Cube {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "cube"
    }

    fn uniforms(&self) -> Vec<UniformDecl> {
        vec![
            UniformDecl::vec3(self.min_name()),
            UniformDecl::vec3(self.max_name()),
        ]
    }

    fn emit_intersection_test(&self) -> String {
        format!(
            "    let {} = intersect_cube(origin, ray, {}, {});\n",
            self.t_name(),
            UniformDecl::vec3(self.min_name()).expr(),
            UniformDecl::vec3(self.max_name()).expr()
        )
    }

    fn emit_shadow_test(&self) -> String {
        let t = self.t_name();
        format!(
            "{}    if {t}.x > 0.0 && {t}.x < 1.0 && {t}.x < {t}.y {{ return 0.0; }}\n",
            self.emit_intersection_test()
        )
    }

    fn emit_nearest_hit_update(&self) -> String {
        let t = self.t_name();
        format!("        if {t}.x > 0.0 && {t}.x < {t}.y && {t}.x < t {{ t = {t}.x; }}\n")
    }

    // The `.x < .y` guard keeps coplanar cubes from stealing each other's hit.
    fn emit_normal_branch(&self) -> String {
        let t = self.t_name();
        format!(
            " else if t == {t}.x && {t}.x < {t}.y {{ normal = normal_for_cube(hit, {}, {}); }}",
            UniformDecl::vec3(self.min_name()).expr(),
            UniformDecl::vec3(self.max_name()).expr()
        )
    }

    fn bind_uniforms(&self, sink: &mut dyn UniformSink) {
        let bounds = self.bounding_box();
        sink.set_vec3(&self.min_name(), bounds.min);
        sink.set_vec3(&self.max_name(), bounds.max);
    }

    fn analytic_intersect(&self, ray: &Ray) -> f32 {
        self.bounding_box().intersect(ray)
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds.translate(self.temporary_translation)
    }

    fn temporary_translation(&self) -> Vec3 {
        self.temporary_translation
    }

    fn temporary_translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.temporary_translation = translation;
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }

    fn translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.bounds = self.bounds.translate(translation);
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdAllocator;
    use glint_math::MISS;

    fn cube() -> Cube {
        Cube::new(
            IdAllocator::new().allocate(),
            Vec3::splat(-0.25),
            Vec3::splat(0.25),
        )
    }

    #[test]
    fn test_cube_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        assert_eq!(cube().analytic_intersect(&ray), 1.75);
    }

    #[test]
    fn test_cube_follows_preview() {
        let mut cube = cube();
        let mut flags = DirtyFlags::empty();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);

        cube.temporary_translate(Vec3::new(1.0, 0.0, 0.0), &mut flags);
        assert_eq!(cube.analytic_intersect(&ray), MISS);
        assert_eq!(cube.min_corner(), Vec3::splat(-0.25));

        cube.temporary_translate(Vec3::ZERO, &mut flags);
        cube.translate(Vec3::new(0.0, 0.0, 0.5), &mut flags);
        assert_eq!(cube.analytic_intersect(&ray), 2.25);
    }

    #[test]
    fn test_cube_fragments() {
        let cube = cube();

        assert_eq!(
            cube.emit_declarations(),
            "    cube_min_0: vec4<f32>,\n    cube_max_0: vec4<f32>,\n"
        );
        assert!(cube
            .emit_shadow_test()
            .contains("if t_cube_0.x > 0.0 && t_cube_0.x < 1.0 && t_cube_0.x < t_cube_0.y"));
        assert!(cube
            .emit_nearest_hit_update()
            .contains("t_cube_0.x < t { t = t_cube_0.x; }"));
        assert!(cube
            .emit_normal_branch()
            .contains("normal_for_cube(hit, u.cube_min_0.xyz, u.cube_max_0.xyz)"));
    }
}
