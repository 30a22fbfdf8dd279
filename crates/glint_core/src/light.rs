//! The single point light and its draggable gizmo.

use glint_math::{Aabb, Ray, Vec3};

use crate::renderable::{ObjectId, Renderable, UniformDecl, UniformSink};
use crate::DirtyFlags;

/// The scene's only light source.
///
/// The light is not visible in the traced image. It exists in the program as
/// a single position uniform and in the editor as a small cube gizmo of half
/// size [`Light::SIZE`] that can be picked and dragged. Its position is kept
/// inside the room, away from the walls.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    id: ObjectId,
    position: Vec3,
    temporary_translation: Vec3,
}

impl Light {
    /// Half size of the gizmo, also the radius of the soft-shadow jitter.
    pub const SIZE: f32 = 0.1;

    pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.4, 0.5, -0.6);

    pub fn new(id: ObjectId) -> Self {
        Self::with_position(id, Self::DEFAULT_POSITION)
    }

    pub fn with_position(id: ObjectId, position: Vec3) -> Self {
        Self {
            id,
            position: Self::clamp_position(position),
            temporary_translation: Vec3::ZERO,
        }
    }

    /// Clamp each component into `[SIZE - 1, 1 - SIZE]`.
    pub fn clamp_position(position: Vec3) -> Vec3 {
        position.clamp(Vec3::splat(Self::SIZE - 1.0), Vec3::splat(1.0 - Self::SIZE))
    }

    /// Committed position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Position including the drag preview.
    pub fn current_position(&self) -> Vec3 {
        self.position + self.temporary_translation
    }

    fn uniform_name(&self) -> String {
        format!("light_{}", self.id)
    }
}

impl Renderable for Light {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "light"
    }

    fn uniforms(&self) -> Vec<UniformDecl> {
        vec![UniformDecl::vec3(self.uniform_name())]
    }

    fn light_position_expr(&self) -> Option<String> {
        Some(UniformDecl::vec3(self.uniform_name()).expr())
    }

    fn bind_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_vec3(&self.uniform_name(), self.current_position());
    }

    fn analytic_intersect(&self, ray: &Ray) -> f32 {
        self.bounding_box().intersect(ray)
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.current_position(), Self::SIZE)
    }

    fn temporary_translation(&self) -> Vec3 {
        self.temporary_translation
    }

    fn temporary_translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        let previewed = Self::clamp_position(self.position + translation);
        self.temporary_translation = previewed - self.position;
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }

    fn translate(&mut self, translation: Vec3, flags: &mut DirtyFlags) {
        self.position = Self::clamp_position(self.position + translation);
        flags.mark(DirtyFlags::OBJECT_POSITION);
    }
}
