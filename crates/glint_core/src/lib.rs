//! Glint Core - scene model for the progressive path tracer.
//!
//! This crate provides:
//!
//! - **Change tracking**: [`DirtyFlags`], the register every edit marks and the
//!   renderer consumes once per frame
//! - **Scene types**: [`Scene`], [`Camera`], [`Material`], [`Environment`]
//! - **Renderables**: [`Light`], [`Sphere`], [`Cube`] behind the
//!   [`Renderable`] capability trait
//! - **Interaction**: [`Picker`] for selection and drag manipulation
//! - **Templates**: canonical object arrangements
//!
//! # Example
//!
//! ```
//! use glint_core::{Scene, Template};
//!
//! let mut scene = Scene::new();
//! scene.load_template(Template::SphereColumn);
//! let invalidation = scene.flags_mut().take();
//! assert!(invalidation.rebuild);
//! ```

pub mod camera;
pub mod error;
pub mod flags;
pub mod light;
pub mod material;
pub mod picking;
pub mod renderable;
pub mod scene;
pub mod shapes;
pub mod templates;

// Re-export commonly used types
pub use camera::Camera;
pub use error::ParseError;
pub use flags::{DirtyFlags, FrameInvalidation};
pub use light::Light;
pub use material::{Environment, Material, MaterialKind};
pub use picking::{DragSession, Picker};
pub use renderable::{
    IdAllocator, ObjectId, Renderable, SceneObject, UniformDecl, UniformSink, UniformType,
};
pub use scene::Scene;
pub use shapes::{Cube, Sphere};
pub use templates::Template;
