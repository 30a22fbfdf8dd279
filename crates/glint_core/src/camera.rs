//! Orbit camera looking at the origin of the room.

use glint_math::{Mat4, Mat4Ext, Ray, Vec3};

use crate::DirtyFlags;

/// Orbit camera described by pitch, yaw and zoom distance.
///
/// The eye position and the combined view-projection matrix are cached and
/// recomputed on every mutation, which also marks [`DirtyFlags::CAMERA`].
#[derive(Debug, Clone)]
pub struct Camera {
    pitch: f32,
    yaw: f32,
    zoom: f32,

    // Cached computed values (refreshed by every setter)
    eye: Vec3,
    view_projection: Mat4,
}

impl Camera {
    /// Vertical field of view in degrees.
    pub const FOV_Y_DEGREES: f32 = 55.0;
    pub const ASPECT: f32 = 1.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 100.0;

    /// Pitch stays this far away from the poles so the view never flips.
    pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
    /// Radians of orbit per pixel of mouse movement.
    pub const ORBIT_SENSITIVITY: f32 = 0.01;
    pub const MIN_ZOOM: f32 = 0.05;

    /// Create a camera at pitch 0, yaw 0, zoom 2.5.
    pub fn new() -> Self {
        let mut camera = Self {
            pitch: 0.0,
            yaw: 0.0,
            zoom: 2.5,
            eye: Vec3::ZERO,
            view_projection: Mat4::IDENTITY,
        };
        camera.refresh();
        camera
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the pitch angle in radians.
    pub fn set_pitch(&mut self, pitch: f32, flags: &mut DirtyFlags) {
        self.pitch = pitch;
        self.invalidate(flags);
    }

    /// Set the yaw angle in radians.
    pub fn set_yaw(&mut self, yaw: f32, flags: &mut DirtyFlags) {
        self.yaw = yaw;
        self.invalidate(flags);
    }

    /// Set the distance from the origin.
    pub fn set_zoom(&mut self, zoom: f32, flags: &mut DirtyFlags) {
        self.zoom = zoom.max(Self::MIN_ZOOM);
        self.invalidate(flags);
    }

    /// Orbit by a mouse delta in pixels.
    ///
    /// Horizontal movement turns yaw, vertical movement turns pitch, and pitch
    /// is kept short of straight up or down.
    pub fn orbit(&mut self, dx: f32, dy: f32, flags: &mut DirtyFlags) {
        self.yaw -= dx * Self::ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + dy * Self::ORBIT_SENSITIVITY)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.invalidate(flags);
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Projection × view, using OpenGL clip conventions.
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// World-space direction from the eye through an NDC position.
    ///
    /// Unprojects `(ndc_x, ndc_y, 0, 1)` with `inverse`, divides by w and
    /// subtracts the eye. `inverse` may be a jittered inverse transform.
    pub fn eye_ray(&self, inverse: &Mat4, ndc_x: f32, ndc_y: f32) -> Vec3 {
        inverse.unproject_ndc(ndc_x, ndc_y) - self.eye
    }

    /// Unjittered world-space ray through an NDC position, for picking.
    pub fn pick_ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let inverse = self.view_projection.inverse();
        Ray::new(self.eye, self.eye_ray(&inverse, ndc_x, ndc_y))
    }

    fn invalidate(&mut self, flags: &mut DirtyFlags) {
        self.refresh();
        flags.mark(DirtyFlags::CAMERA);
    }

    fn refresh(&mut self) {
        self.eye = self.zoom
            * Vec3::new(
                self.yaw.sin() * self.pitch.cos(),
                self.pitch.sin(),
                self.yaw.cos() * self.pitch.cos(),
            );

        let view = Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(
            Self::FOV_Y_DEGREES.to_radians(),
            Self::ASPECT,
            Self::NEAR,
            Self::FAR,
        );
        self.view_projection = projection * view;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
