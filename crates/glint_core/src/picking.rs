//! Selection and drag manipulation driven by pointer events.
//!
//! A press on the selected object's bounding box starts a drag constrained to
//! the plane of the face that was struck. A press anywhere else selects the
//! nearest renderable under the pointer. While dragging, the selection gets a
//! temporary translation; releasing commits it.

use glint_math::{is_hit, Ray, Vec3};

use crate::renderable::ObjectId;
use crate::Scene;

/// Tolerance for deciding which box face a hit point lies on.
pub const FACE_EPSILON: f32 = 0.001;

/// State of an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// The renderable being dragged.
    pub object: ObjectId,
    /// Outward normal of the face that was grabbed.
    pub normal: Vec3,
    /// Plane offset `normal · hit` of the grabbed face.
    pub distance: f32,
    /// Point where the face was first hit.
    pub original_hit: Vec3,
}

impl DragSession {
    /// Offset from the grab point to where `ray` crosses the drag plane.
    ///
    /// Returns `None` when the ray is parallel to the plane.
    pub fn delta(&self, ray: &Ray) -> Option<Vec3> {
        let t = ray.plane_parameter(self.normal, self.distance);
        if !t.is_finite() {
            return None;
        }
        Some(ray.at(t) - self.original_hit)
    }
}

/// Turns pixel-space pointer events into selection and drag edits.
#[derive(Debug, Clone)]
pub struct Picker {
    width: f32,
    height: f32,
    drag: Option<DragSession>,
}

impl Default for Picker {
    fn default() -> Self {
        Self::new()
    }
}

impl Picker {
    /// Create a picker for a 512x512 viewport.
    pub fn new() -> Self {
        Self::with_viewport(512, 512)
    }

    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            drag: None,
        }
    }

    /// Update the viewport size after a resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Convert pixel coordinates (origin top-left) to NDC.
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0)
    }

    fn ray(&self, scene: &Scene, x: f32, y: f32) -> Ray {
        let (ndc_x, ndc_y) = self.to_ndc(x, y);
        scene.camera().pick_ray(ndc_x, ndc_y)
    }

    /// Handle a button press.
    ///
    /// Returns true if the event was consumed (a drag started or something
    /// was selected). An unconsumed press is free to orbit the camera.
    ///
    /// A press that arrives while a drag is still active (the release was
    /// lost) abandons that drag and discards its preview.
    pub fn pointer_down(&mut self, scene: &mut Scene, x: f32, y: f32) -> bool {
        if let Some(stale) = self.drag.take() {
            scene.temporary_translate(stale.object, Vec3::ZERO);
        }
        let ray = self.ray(scene, x, y);

        if let Some(selected) = scene.selected_renderable() {
            let bounds = selected.bounding_box();
            let t = bounds.intersect(&ray);
            if is_hit(t) {
                let hit = ray.at(t);
                let normal = bounds.face_normal(hit, FACE_EPSILON);
                log::debug!("Dragging {} {} along {}", selected.kind(), selected.id(), normal);
                self.drag = Some(DragSession {
                    object: selected.id(),
                    normal,
                    distance: normal.dot(hit),
                    original_hit: hit,
                });
                return true;
            }
        }

        match scene.pick(&ray) {
            Some((id, _)) => {
                scene.select(id);
                true
            }
            None => {
                scene.clear_selection();
                false
            }
        }
    }

    /// Handle pointer motion. Returns true if a drag preview was updated.
    pub fn pointer_move(&mut self, scene: &mut Scene, x: f32, y: f32) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let ray = self.ray(scene, x, y);
        let Some(delta) = drag.delta(&ray) else {
            return false;
        };
        if !scene.temporary_translate(drag.object, delta) {
            // Deleted mid-drag
            self.drag = None;
            return false;
        }
        true
    }

    /// Handle a button release, committing an active drag.
    pub fn pointer_up(&mut self, scene: &mut Scene, x: f32, y: f32) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if !scene.temporary_translate(drag.object, Vec3::ZERO) {
            return false;
        }
        let ray = self.ray(scene, x, y);
        if let Some(delta) = drag.delta(&ray) {
            scene.translate(drag.object, delta);
        }
        true
    }
}
