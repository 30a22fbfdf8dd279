//! Visible primitives.

mod cube;
mod sphere;

pub use cube::Cube;
pub use sphere::Sphere;
