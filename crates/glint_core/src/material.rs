//! Global surface material and room environment.

use std::fmt;
use std::str::FromStr;

use crate::{DirtyFlags, ParseError};

/// How object surfaces scatter light. One kind applies to every object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Cosine-weighted diffuse bounce.
    #[default]
    Diffuse,
    /// Perfect reflection with a sharp highlight.
    Mirror,
    /// Reflection perturbed by the glossiness factor.
    Glossy,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 3] = [Self::Diffuse, Self::Mirror, Self::Glossy];

    /// The next kind in [`MaterialKind::ALL`], wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Diffuse => Self::Mirror,
            Self::Mirror => Self::Glossy,
            Self::Glossy => Self::Diffuse,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Mirror => "mirror",
            Self::Glossy => "glossy",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownMaterial(s.to_string()))
    }
}

/// Surface material shared by all objects in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    kind: MaterialKind,
    glossiness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            glossiness: 0.6,
        }
    }
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn glossiness(&self) -> f32 {
        self.glossiness
    }

    /// Change the material kind. Marks MATERIAL_TYPE only on an actual change.
    pub fn set_kind(&mut self, kind: MaterialKind, flags: &mut DirtyFlags) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        flags.mark(DirtyFlags::MATERIAL_TYPE);
    }

    /// Change the glossiness factor.
    ///
    /// The value is clamped into [0, 1] and NaN becomes 0. Marks MATERIAL_PARAM
    /// only when the stored value changes.
    pub fn set_glossiness(&mut self, glossiness: f32, flags: &mut DirtyFlags) {
        let glossiness = if glossiness.is_nan() {
            0.0
        } else {
            glossiness.clamp(0.0, 1.0)
        };
        if glossiness == self.glossiness {
            return;
        }
        self.glossiness = glossiness;
        flags.mark(DirtyFlags::MATERIAL_PARAM);
    }
}

/// Wall palette of the Cornell-box room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Blue -X wall, yellow +X wall.
    #[default]
    YellowBlue,
    /// Red -X wall, green +X wall.
    RedGreen,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Self::YellowBlue, Self::RedGreen];

    pub fn next(self) -> Self {
        match self {
            Self::YellowBlue => Self::RedGreen,
            Self::RedGreen => Self::YellowBlue,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::YellowBlue => "yellow-blue",
            Self::RedGreen => "red-green",
        }
    }

    /// Colors of the (-X, +X) walls.
    pub fn wall_colors(self) -> ([f32; 3], [f32; 3]) {
        match self {
            Self::YellowBlue => ([0.1, 0.5, 1.0], [1.0, 0.9, 0.1]),
            Self::RedGreen => ([1.0, 0.3, 0.1], [0.3, 1.0, 0.1]),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownEnvironment(s.to_string()))
    }
}
