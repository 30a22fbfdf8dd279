//! The editable scene: light, objects, selection, camera and surface settings.

use glint_math::{is_hit, Ray, Vec3, MISS};

use crate::renderable::{IdAllocator, ObjectId, Renderable, SceneObject};
use crate::shapes::{Cube, Sphere};
use crate::templates::Template;
use crate::{Camera, DirtyFlags, Environment, Light, Material, MaterialKind};

/// Everything the user edits during a session.
///
/// The scene owns the dirty-flag register. Every mutator marks the bits its
/// change affects; the renderer consumes them through [`Scene::flags_mut`].
#[derive(Debug)]
pub struct Scene {
    ids: IdAllocator,
    light: Light,
    objects: Vec<SceneObject>,
    selection: Option<ObjectId>,
    camera: Camera,
    material: Material,
    environment: Environment,
    flags: DirtyFlags,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty room with the default light, camera and material.
    ///
    /// Every dirty bit starts set so the first frame builds everything.
    pub fn new() -> Self {
        let mut ids = IdAllocator::new();
        let light = Light::new(ids.allocate());
        Self {
            ids,
            light,
            objects: Vec::new(),
            selection: None,
            camera: Camera::new(),
            material: Material::default(),
            environment: Environment::default(),
            flags: DirtyFlags::all(),
        }
    }

    /// Current dirty bits.
    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    /// Mutable access to the register, for the renderer's once-per-frame take.
    pub fn flags_mut(&mut self) -> &mut DirtyFlags {
        &mut self.flags
    }

    /// Allocator for building objects handed to [`Scene::set_objects`].
    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// All renderables in program order: the light first, then the objects.
    pub fn renderables(&self) -> impl Iterator<Item = &dyn Renderable> + '_ {
        std::iter::once(&self.light as &dyn Renderable)
            .chain(self.objects.iter().map(|object| object as &dyn Renderable))
    }

    /// Look up a renderable by id.
    pub fn renderable(&self, id: ObjectId) -> Option<&dyn Renderable> {
        self.renderables().find(|renderable| renderable.id() == id)
    }

    fn renderable_and_flags(
        &mut self,
        id: ObjectId,
    ) -> Option<(&mut dyn Renderable, &mut DirtyFlags)> {
        let flags = &mut self.flags;
        if self.light.id() == id {
            let light: &mut dyn Renderable = &mut self.light;
            return Some((light, flags));
        }
        self.objects
            .iter_mut()
            .find(|object| object.id() == id)
            .map(|object| (object as &mut dyn Renderable, flags))
    }

    /// Replace the object list. Clears the selection.
    pub fn set_objects(&mut self, objects: Vec<SceneObject>) {
        self.objects = objects;
        self.selection = None;
        self.flags.mark(DirtyFlags::OBJECT_COUNT);
    }

    /// Replace the objects with one of the canonical arrangements.
    pub fn load_template(&mut self, template: Template) {
        let objects = template.build(&mut self.ids);
        log::info!("Loaded template {} ({} objects)", template, objects.len());
        self.set_objects(objects);
    }

    /// Add a sphere of radius 0.25 at the origin.
    pub fn add_sphere(&mut self) -> ObjectId {
        let id = self.ids.allocate();
        self.push_object(Sphere::new(id, Vec3::ZERO, Sphere::DEFAULT_RADIUS).into());
        id
    }

    /// Add a cube of half size 0.25 centred on the origin.
    pub fn add_cube(&mut self) -> ObjectId {
        let id = self.ids.allocate();
        let half = Vec3::splat(Cube::DEFAULT_HALF_SIZE);
        self.push_object(Cube::new(id, -half, half).into());
        id
    }

    fn push_object(&mut self, object: SceneObject) {
        log::debug!("Added {} {}", object.kind(), object.id());
        self.objects.push(object);
        self.selection = None;
        self.flags.mark(DirtyFlags::OBJECT_COUNT);
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selection
    }

    /// The selected renderable, if the selection still resolves.
    pub fn selected_renderable(&self) -> Option<&dyn Renderable> {
        self.selection.and_then(|id| self.renderable(id))
    }

    /// Select a renderable. Returns false, leaving the selection unchanged, if
    /// no renderable has this id.
    pub fn select(&mut self, id: ObjectId) -> bool {
        if self.renderable(id).is_none() {
            return false;
        }
        self.selection = Some(id);
        true
    }

    pub fn select_light(&mut self) {
        self.selection = Some(self.light.id());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Remove the selected object.
    ///
    /// The light is never removed. Returns true if an object was deleted.
    pub fn delete_selection(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let Some(index) = self.objects.iter().position(|object| object.id() == id) else {
            return false;
        };

        let removed = self.objects.remove(index);
        log::debug!("Deleted {} {}", removed.kind(), id);
        self.selection = None;
        self.flags.mark(DirtyFlags::OBJECT_COUNT);
        true
    }

    /// Nearest renderable hit by `ray`, with its distance.
    pub fn pick(&self, ray: &Ray) -> Option<(ObjectId, f32)> {
        let mut nearest = None;
        let mut nearest_t = MISS;
        for renderable in self.renderables() {
            let t = renderable.analytic_intersect(ray);
            if is_hit(t) && t < nearest_t {
                nearest_t = t;
                nearest = Some(renderable.id());
            }
        }
        nearest.map(|id| (id, nearest_t))
    }

    /// Replace the drag preview of a renderable. Returns false if `id` is gone.
    pub fn temporary_translate(&mut self, id: ObjectId, translation: Vec3) -> bool {
        match self.renderable_and_flags(id) {
            Some((renderable, flags)) => {
                renderable.temporary_translate(translation, flags);
                true
            }
            None => false,
        }
    }

    /// Permanently move a renderable. Returns false if `id` is gone.
    pub fn translate(&mut self, id: ObjectId, translation: Vec3) -> bool {
        match self.renderable_and_flags(id) {
            Some((renderable, flags)) => {
                renderable.translate(translation, flags);
                true
            }
            None => false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Orbit the camera by a mouse delta in pixels.
    pub fn orbit_camera(&mut self, dx: f32, dy: f32) {
        self.camera.orbit(dx, dy, &mut self.flags);
    }

    pub fn set_camera_angles(&mut self, pitch: f32, yaw: f32) {
        self.camera.set_pitch(pitch, &mut self.flags);
        self.camera.set_yaw(yaw, &mut self.flags);
    }

    pub fn set_camera_zoom(&mut self, zoom: f32) {
        self.camera.set_zoom(zoom, &mut self.flags);
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material_kind(&mut self, kind: MaterialKind) {
        self.material.set_kind(kind, &mut self.flags);
    }

    /// Set the glossiness factor (clamped into [0, 1], NaN becomes 0).
    pub fn set_glossiness(&mut self, glossiness: f32) {
        self.material.set_glossiness(glossiness, &mut self.flags);
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        if environment == self.environment {
            return;
        }
        self.environment = environment;
        self.flags.mark(DirtyFlags::ENVIRONMENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_scene() -> Scene {
        let mut scene = Scene::new();
        scene.flags_mut().take();
        scene
    }

    #[test]
    fn test_new_scene_builds_everything() {
        let mut scene = Scene::new();
        let invalidation = scene.flags_mut().take();

        assert!(invalidation.rebuild);
        assert!(invalidation.reset);
        assert_eq!(scene.renderables().count(), 1);
        assert_eq!(scene.light().position(), Light::DEFAULT_POSITION);
    }

    #[test]
    fn test_add_object_rebuilds() {
        let mut scene = settled_scene();
        scene.add_sphere();

        assert!(scene.flags().needs_rebuild());
        assert_eq!(scene.objects().len(), 1);
    }

    #[test]
    fn test_camera_only_resets() {
        let mut scene = settled_scene();
        scene.orbit_camera(10.0, 5.0);

        assert!(scene.flags().needs_reset());
        assert!(!scene.flags().needs_rebuild());
    }

    #[test]
    fn test_ids_stay_unique_across_edits() {
        let mut scene = settled_scene();
        let a = scene.add_sphere();
        let b = scene.add_cube();
        scene.select(a);
        scene.delete_selection();
        let c = scene.add_sphere();

        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_ne!(scene.light().id(), c);
    }

    #[test]
    fn test_renderables_light_first() {
        let mut scene = settled_scene();
        let sphere = scene.add_sphere();
        let cube = scene.add_cube();

        let ids: Vec<ObjectId> = scene.renderables().map(|r| r.id()).collect();
        assert_eq!(ids, vec![scene.light().id(), sphere, cube]);
    }

    #[test]
    fn test_delete_selection() {
        let mut scene = settled_scene();
        let sphere = scene.add_sphere();
        scene.flags_mut().take();

        // Nothing selected
        assert!(!scene.delete_selection());
        assert!(scene.flags().is_empty());

        // The light is never deleted
        scene.select_light();
        assert!(!scene.delete_selection());
        assert!(scene.flags().is_empty());

        assert!(scene.select(sphere));
        assert!(scene.delete_selection());
        assert!(scene.objects().is_empty());
        assert_eq!(scene.selected(), None);
        assert!(scene.flags().contains(DirtyFlags::OBJECT_COUNT));
    }

    #[test]
    fn test_select_unknown_id_is_rejected() {
        let mut scene = settled_scene();
        let sphere = scene.add_sphere();
        scene.select(sphere);
        scene.set_objects(Vec::new());

        assert_eq!(scene.selected(), None);
        assert!(!scene.select(sphere));
        assert!(scene.selected_renderable().is_none());
    }

    #[test]
    fn test_material_marks_only_on_change() {
        let mut scene = settled_scene();

        scene.set_material_kind(MaterialKind::Diffuse);
        scene.set_glossiness(0.6);
        scene.set_environment(Environment::YellowBlue);
        assert!(scene.flags().is_empty());

        scene.set_glossiness(2.0);
        assert_eq!(scene.material().glossiness(), 1.0);
        assert_eq!(scene.flags(), DirtyFlags::MATERIAL_PARAM);

        scene.set_environment(Environment::RedGreen);
        assert!(scene.flags().needs_rebuild());
    }

    #[test]
    fn test_pick_nearest() {
        let mut scene = settled_scene();
        let ids = scene.ids_mut();
        let near = ids.allocate();
        let far = ids.allocate();
        scene.set_objects(vec![
            Sphere::new(far, Vec3::new(0.0, 0.0, 0.5), 0.25).into(),
            Sphere::new(near, Vec3::ZERO, 0.25).into(),
        ]);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        assert_eq!(scene.pick(&ray), Some((near, 1.75)));

        let miss = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::NEG_Z);
        assert_eq!(scene.pick(&miss), None);
    }

    #[test]
    fn test_translate_missing_object() {
        let mut scene = settled_scene();
        let sphere = scene.add_sphere();
        scene.select(sphere);
        scene.delete_selection();
        scene.flags_mut().take();

        assert!(!scene.translate(sphere, Vec3::X));
        assert!(scene.flags().is_empty());
    }
}
