//! Canonical object arrangements the editor can load in one step.

use std::fmt;
use std::str::FromStr;

use glint_math::Vec3;

use crate::renderable::{IdAllocator, SceneObject};
use crate::shapes::{Cube, Sphere};
use crate::ParseError;

const ROOT3_OVER4: f32 = 0.433012701892219;
const ROOT3_OVER6: f32 = 0.288675134594813;
const ROOT6_OVER6: f32 = 0.408248290463863;

/// A named preset arrangement of spheres and cubes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Template {
    /// Four stacked spheres.
    #[default]
    SphereColumn,
    /// Ten close-packed spheres in a tetrahedron.
    SpherePyramid,
    /// A sphere resting on a low block.
    SphereAndCube,
    /// A cube with six spheres poking out of its faces.
    CubeAndSpheres,
    /// A table with a sphere on it next to a chair.
    TableAndChair,
    /// Two stacked tables.
    Stacks,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Self::SphereColumn,
        Self::SpherePyramid,
        Self::SphereAndCube,
        Self::CubeAndSpheres,
        Self::TableAndChair,
        Self::Stacks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SphereColumn => "sphere-column",
            Self::SpherePyramid => "sphere-pyramid",
            Self::SphereAndCube => "sphere-and-cube",
            Self::CubeAndSpheres => "cube-and-spheres",
            Self::TableAndChair => "table-and-chair",
            Self::Stacks => "stacks",
        }
    }

    /// Create the arrangement, drawing fresh ids from `ids`.
    pub fn build(self, ids: &mut IdAllocator) -> Vec<SceneObject> {
        let mut builder = Builder { ids, objects: Vec::new() };
        match self {
            Self::SphereColumn => {
                for y in [0.75, 0.25, -0.25, -0.75] {
                    builder.sphere([0.0, y, 0.0]);
                }
            }
            Self::SpherePyramid => {
                // First level
                builder.sphere([-0.5, -0.75, -ROOT3_OVER6]);
                builder.sphere([0.0, -0.75, -ROOT3_OVER6]);
                builder.sphere([0.5, -0.75, -ROOT3_OVER6]);
                builder.sphere([-0.25, -0.75, ROOT3_OVER4 - ROOT3_OVER6]);
                builder.sphere([0.25, -0.75, ROOT3_OVER4 - ROOT3_OVER6]);
                builder.sphere([0.0, -0.75, 2.0 * ROOT3_OVER4 - ROOT3_OVER6]);
                // Second level
                builder.sphere([0.0, -0.75 + ROOT6_OVER6, ROOT3_OVER6]);
                builder.sphere([-0.25, -0.75 + ROOT6_OVER6, -0.5 * ROOT3_OVER6]);
                builder.sphere([0.25, -0.75 + ROOT6_OVER6, -0.5 * ROOT3_OVER6]);
                // Third level
                builder.sphere([0.0, -0.75 + 2.0 * ROOT6_OVER6, 0.0]);
            }
            Self::SphereAndCube => {
                builder.cube([-0.25, -1.0, -0.25], [0.25, -0.75, 0.25]);
                builder.sphere([0.0, -0.75, 0.0]);
            }
            Self::CubeAndSpheres => {
                builder.cube([-0.25, -0.25, -0.25], [0.25, 0.25, 0.25]);
                builder.sphere([-0.25, 0.0, 0.0]);
                builder.sphere([0.25, 0.0, 0.0]);
                builder.sphere([0.0, -0.25, 0.0]);
                builder.sphere([0.0, 0.25, 0.0]);
                builder.sphere([0.0, 0.0, -0.25]);
                builder.sphere([0.0, 0.0, 0.25]);
            }
            Self::TableAndChair => {
                // Table top and legs
                builder.cube([-0.5, -0.35, -0.5], [0.3, -0.3, 0.5]);
                builder.cube([-0.45, -1.0, -0.45], [-0.4, -0.35, -0.4]);
                builder.cube([0.2, -1.0, -0.45], [0.25, -0.35, -0.4]);
                builder.cube([-0.45, -1.0, 0.4], [-0.4, -0.35, 0.45]);
                builder.cube([0.2, -1.0, 0.4], [0.25, -0.35, 0.45]);
                // Chair seat and legs
                builder.cube([0.3, -0.6, -0.2], [0.7, -0.55, 0.2]);
                builder.cube([0.3, -1.0, -0.2], [0.35, -0.6, -0.15]);
                builder.cube([0.3, -1.0, 0.15], [0.35, -0.6, 0.2]);
                builder.cube([0.65, -1.0, -0.2], [0.7, 0.1, -0.15]);
                builder.cube([0.65, -1.0, 0.15], [0.7, 0.1, 0.2]);
                // Chair back
                builder.cube([0.65, 0.05, -0.15], [0.7, 0.1, 0.15]);
                builder.cube([0.65, -0.55, -0.09], [0.7, 0.1, -0.03]);
                builder.cube([0.65, -0.55, 0.03], [0.7, 0.1, 0.09]);
                // Sphere on the table
                builder.sphere([-0.1, -0.05, 0.0]);
            }
            Self::Stacks => {
                // Lower level and its poles
                builder.cube([-0.5, -0.75, -0.5], [0.5, -0.7, 0.5]);
                builder.cube([-0.45, -1.0, -0.45], [-0.4, -0.45, -0.4]);
                builder.cube([0.4, -1.0, -0.45], [0.45, -0.45, -0.4]);
                builder.cube([-0.45, -1.0, 0.4], [-0.4, -0.45, 0.45]);
                builder.cube([0.4, -1.0, 0.4], [0.45, -0.45, 0.45]);
                // Middle level and its poles
                builder.cube([-0.3, -0.5, -0.3], [0.3, -0.45, 0.3]);
                builder.cube([-0.25, -0.7, -0.25], [-0.2, -0.25, -0.2]);
                builder.cube([0.2, -0.7, -0.25], [0.25, -0.25, -0.2]);
                builder.cube([-0.25, -0.7, 0.2], [-0.2, -0.25, 0.25]);
                builder.cube([0.2, -0.7, 0.2], [0.25, -0.25, 0.25]);
                // Top
                builder.cube([-0.25, -0.25, -0.25], [0.25, -0.2, 0.25]);
            }
        }
        builder.objects
    }
}

struct Builder<'a> {
    ids: &'a mut IdAllocator,
    objects: Vec<SceneObject>,
}

impl Builder<'_> {
    fn sphere(&mut self, center: [f32; 3]) {
        let sphere = Sphere::new(self.ids.allocate(), Vec3::from(center), Sphere::DEFAULT_RADIUS);
        self.objects.push(sphere.into());
    }

    fn cube(&mut self, min: [f32; 3], max: [f32; 3]) {
        let cube = Cube::new(self.ids.allocate(), Vec3::from(min), Vec3::from(max));
        self.objects.push(cube.into());
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownTemplate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Renderable;

    #[test]
    fn test_template_object_counts() {
        let mut ids = IdAllocator::new();
        let counts: Vec<usize> = Template::ALL
            .iter()
            .map(|template| template.build(&mut ids).len())
            .collect();

        assert_eq!(counts, vec![4, 10, 2, 7, 14, 11]);
    }

    #[test]
    fn test_templates_draw_fresh_ids() {
        let mut ids = IdAllocator::new();
        let first = Template::SphereColumn.build(&mut ids);
        let second = Template::SphereColumn.build(&mut ids);

        let mut all: Vec<_> = first.iter().chain(&second).map(|o| o.id()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 8);
    }

    #[test]
    fn test_template_objects_stay_in_room() {
        let mut ids = IdAllocator::new();
        for template in Template::ALL {
            for object in template.build(&mut ids) {
                let bounds = object.bounding_box();
                assert!(bounds.min.cmpge(Vec3::splat(-1.0)).all(), "{template}");
                assert!(bounds.max.cmple(Vec3::splat(1.0)).all(), "{template}");
            }
        }
    }

    #[test]
    fn test_template_from_str() {
        assert_eq!("Stacks".parse::<Template>(), Ok(Template::Stacks));
        assert_eq!(
            "table-and-chair".parse::<Template>(),
            Ok(Template::TableAndChair)
        );
        assert!("castle".parse::<Template>().is_err());
    }
}
