use glint_math::{Aabb, Ray, Vec3, MISS};

use crate::renderable::{ObjectId, Renderable, UniformDecl, UniformSink};
use crate::DirtyFlags;

/// A sphere given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    id: ObjectId,
    center: Vec3,
    radius: f32,
    temporary_translation: Vec3,
}

impl Sphere {
    pub const DEFAULT_RADIUS: f32 = 0.25;

    pub fn new(id: ObjectId, center: Vec3, radius: f32) -> Self {
        Self {
            id,
            center,
            radius,
            temporary_translation: Vec3::ZERO,
        }
    }

    /// Ray/sphere intersection.
    ///
    /// Solves `a t^2 + b t + c = 0` and returns the smaller root, or [`MISS`]
    /// when the discriminant is not positive or the root is behind the origin.
    pub fn intersect(ray: &Ray, center: Vec3, radius: f32) -> f32 {
        let to_sphere = ray.origin - center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * to_sphere.dot(ray.direction);
        let c = to_sphere.dot(to_sphere) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant > 0.0 {
            let t = (-b - discriminant.sqrt()) / (2.0 * a);
            if t > 0.0 {
                return t;
            }
        }
        MISS
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn center_name(&self) -> String {
        format!("sphere_center_{}", self.id)
    }

    fn radius_name(&self) -> String {
        format!("sphere_radius_{}", self.id)
    }

    fn t_name(&self) -> String {
        format!("t_sphere_{}", self.id)
    }

    fn center_expr(&self) -> String {
        UniformDecl::vec3(self.center_name()).expr()
    }

    fn radius_expr(&self) -> String {
        UniformDecl::float(self.radius_name()).expr()
    }
}

impl Renderable for Sphere {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "sphere"
    }

    fn uniforms(&self) -> Vec<UniformDecl> {
        vec![
            UniformDecl::vec3(self.center_name()),
            UniformDecl::float(self.radius_name()),
        ]
    }

    fn emit_intersection_test(&self) -> String {
        format!(
            "    let {} = intersect_sphere(origin, ray, {}, {});\n",
            self.t_name(),
            self.center_expr(),
            self.radius_expr()
        )
    }

    fn emit_shadow_test(&self) -> String {
        format!(
            "{}    if {} < 1.0 {{ return 0.0; }}\n",
            self.emit_intersection_test(),
            self.t_name()
        )
    }

    fn emit_nearest_hit_update(&self) -> String {
        let t = self.t_name();
        format!("        if {t} < t {{ t = {t}; }}\n")
    }

    fn emit_normal_branch(&self) -> String {
        format!(
            " else if t == {} {{ normal = normal_for_sphere(hit, {}, {}); }}",
            self.t_name(),
            self.center_expr(),
            self.radius_expr()
        )
    }

    fn bind_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_vec3(&self.center_name(), self.center + self.temporary_translation);
        sink.set_float(&self.radius_name(), self.radius);
    }

    fn analytic_intersect(&self, ray: &Ray) -> f32 {
        Self::intersect(ray, self.center + self.temporary_translation, self.radius)
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.center + self.temporary_translation, self.radius)
    }

    fn temporary_translation(&self) -> Vec3 {
        self.temporary_translation
    }

    fn temporary_translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.temporary_translation = translation;
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }

    fn translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.center += translation;
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }
}
