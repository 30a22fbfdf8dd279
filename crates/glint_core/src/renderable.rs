//! The renderable capability contract.
//!
//! Every scene entity contributes WGSL fragments to the synthesized tracing
//! program and answers analytic intersection and bounding queries for
//! picking. Program identifiers are derived from the entity's [`ObjectId`]
//! only, so adding or removing objects can never make two objects share a
//! uniform name.

use std::fmt;

use glint_math::{Aabb, Ray, Vec3};

use crate::shapes::{Cube, Sphere};
use crate::DirtyFlags;

/// Name of the uniform block variable inside the synthesized program.
pub const UNIFORM_BLOCK: &str = "u";

/// Session-unique identifier of a renderable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing ids. Ids are never reused.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }
}

/// Shape of a uniform value as seen by the program.
///
/// Every uniform occupies one 16-byte `vec4<f32>` slot so the block layout is
/// trivially computable on the host side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec3,
}

impl UniformType {
    /// WGSL type of the backing slot.
    pub fn wgsl_type(self) -> &'static str {
        "vec4<f32>"
    }

    fn swizzle(self) -> &'static str {
        match self {
            Self::Float => "x",
            Self::Vec3 => "xyz",
        }
    }
}

/// A named uniform declared by a renderable or by the program itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
}

impl UniformDecl {
    pub fn float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: UniformType::Float,
        }
    }

    pub fn vec3(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: UniformType::Vec3,
        }
    }

    /// Struct member declaration line for the uniform block.
    pub fn declaration(&self) -> String {
        format!("    {}: {},\n", self.name, self.ty.wgsl_type())
    }

    /// Expression reading the value inside the program.
    pub fn expr(&self) -> String {
        format!("{}.{}.{}", UNIFORM_BLOCK, self.name, self.ty.swizzle())
    }
}

/// Receiver for per-frame uniform values, keyed by name.
pub trait UniformSink {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
}

/// Capability set shared by every scene entity.
///
/// The `emit_*` fragments run inside the synthesized program where `origin`
/// and `ray` are in scope; the normal branch additionally sees `t`, `hit` and
/// a mutable `normal`. Entities that are not directly visible return empty
/// fragments.
pub trait Renderable {
    /// Immutable session-unique id.
    fn id(&self) -> ObjectId;

    /// Short human-readable kind, for logging.
    fn kind(&self) -> &'static str;

    /// Uniforms this instance declares, in declaration order.
    fn uniforms(&self) -> Vec<UniformDecl>;

    /// Uniform block member declarations for this instance.
    fn emit_declarations(&self) -> String {
        self.uniforms().iter().map(UniformDecl::declaration).collect()
    }

    /// Local computation of this object's hit parameter(s).
    fn emit_intersection_test(&self) -> String {
        String::new()
    }

    /// Early exit returning 0.0 when this object occludes the light.
    fn emit_shadow_test(&self) -> String {
        String::new()
    }

    /// Update of the running nearest `t`.
    fn emit_nearest_hit_update(&self) -> String {
        String::new()
    }

    /// `else if` branch computing `normal` when this object is nearest.
    fn emit_normal_branch(&self) -> String {
        String::new()
    }

    /// Program expression for the light position, if this is a light.
    fn light_position_expr(&self) -> Option<String> {
        None
    }

    /// Push current parameters, including the temporary translation.
    fn bind_uniforms(&self, sink: &mut dyn UniformSink);

    /// Smallest positive hit distance along `ray`, or [`glint_math::MISS`].
    fn analytic_intersect(&self, ray: &Ray) -> f32;

    /// World-space bounds, including the temporary translation.
    fn bounding_box(&self) -> Aabb;

    /// Current uncommitted drag offset.
    fn temporary_translation(&self) -> Vec3;

    /// Replace the uncommitted drag offset (a preview, never committed).
    fn temporary_translate(&mut self, translation: Vec3, flags: &mut DirtyFlags);

    /// Permanently move the object.
    fn translate(&mut self, translation: Vec3, flags: &mut DirtyFlags);
}

/// A user-editable object: the tagged union of visible renderable variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Sphere(Sphere),
    Cube(Cube),
}

impl SceneObject {
    fn inner(&self) -> &dyn Renderable {
        match self {
            Self::Sphere(sphere) => sphere,
            Self::Cube(cube) => cube,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Renderable {
        match self {
            Self::Sphere(sphere) => sphere,
            Self::Cube(cube) => cube,
        }
    }
}

impl From<Sphere> for SceneObject {
    fn from(sphere: Sphere) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<Cube> for SceneObject {
    fn from(cube: Cube) -> Self {
        Self::Cube(cube)
    }
}

impl Renderable for SceneObject {
    fn id(&self) -> ObjectId {
        self.inner().id()
    }

    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn uniforms(&self) -> Vec<UniformDecl> {
        self.inner().uniforms()
    }

    fn emit_declarations(&self) -> String {
        self.inner().emit_declarations()
    }

    fn emit_intersection_test(&self) -> String {
        self.inner().emit_intersection_test()
    }

    fn emit_shadow_test(&self) -> String {
        self.inner().emit_shadow_test()
    }

    fn emit_nearest_hit_update(&self) -> String {
        self.inner().emit_nearest_hit_update()
    }

    fn emit_normal_branch(&self) -> String {
        self.inner().emit_normal_branch()
    }

    fn bind_uniforms(&self, sink: &mut dyn UniformSink) {
        self.inner().bind_uniforms(sink)
    }

    fn analytic_intersect(&self, ray: &Ray) -> f32 {
        self.inner().analytic_intersect(ray)
    }

    fn bounding_box(&self) -> Aabb {
        self.inner().bounding_box()
    }

    fn temporary_translation(&self) -> Vec3 {
        self.inner().temporary_translation()
    }

    fn temporary_translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.inner_mut().temporary_translate(translation, flags)
    }

    fn translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.inner_mut().translate(translation, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();

        assert!(a < b && b < c);
        assert_eq!(c.get(), 2);
    }

    #[test]
    fn test_uniform_decl_text() {
        let decl = UniformDecl::vec3("sphere_center_4");
        assert_eq!(decl.declaration(), "    sphere_center_4: vec4<f32>,\n");
        assert_eq!(decl.expr(), "u.sphere_center_4.xyz");

        let decl = UniformDecl::float("sphere_radius_4");
        assert_eq!(decl.expr(), "u.sphere_radius_4.x");
    }

    #[test]
    fn test_scene_object_dispatch() {
        let mut ids = IdAllocator::new();
        let sphere: SceneObject = Sphere::new(ids.allocate(), Vec3::ZERO, 0.25).into();
        let cube: SceneObject =
            Cube::new(ids.allocate(), Vec3::splat(-0.25), Vec3::splat(0.25)).into();

        assert_eq!(sphere.kind(), "sphere");
        assert_eq!(cube.kind(), "cube");
        assert!(sphere.emit_declarations().contains("sphere_center_0"));
        assert!(cube.emit_declarations().contains("cube_min_1"));
    }
}
