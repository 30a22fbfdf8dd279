//! Uniform block layout and per-frame values.
//!
//! Every uniform occupies one `vec4<f32>` slot, so the block is an array of
//! `[f32; 4]` in declaration order and a name maps to a slot index.

use std::collections::HashMap;

use glint_core::{UniformDecl, UniformSink, UniformType};
use glint_math::Vec3;

/// Slot assignment for every uniform declared by a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    decls: Vec<UniformDecl>,
    slots: HashMap<String, usize>,
}

impl UniformLayout {
    pub fn new(decls: impl IntoIterator<Item = UniformDecl>) -> Self {
        let mut layout = Self::default();
        for decl in decls {
            layout.push(decl);
        }
        layout
    }

    /// Append a uniform. A name that is already present keeps its first slot.
    pub fn push(&mut self, decl: UniformDecl) {
        if self.slots.contains_key(&decl.name) {
            log::warn!("Duplicate uniform {} ignored", decl.name);
            return;
        }
        self.slots.insert(decl.name.clone(), self.decls.len());
        self.decls.push(decl);
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Size of the packed block in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.decls.len() * std::mem::size_of::<[f32; 4]>()
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn decls(&self) -> &[UniformDecl] {
        &self.decls
    }

    /// WGSL `struct Uniforms` declaration matching this layout.
    pub fn wgsl_struct(&self) -> String {
        let mut out = String::from("struct Uniforms {\n");
        for decl in &self.decls {
            out.push_str(&decl.declaration());
        }
        out.push_str("}\n");
        out
    }
}

/// Uniform values for one frame, packed according to a [`UniformLayout`].
///
/// Values for names missing from the layout are dropped, so binding a scene
/// against a program built for an older object set is harmless.
#[derive(Debug, Clone)]
pub struct UniformBlock<'a> {
    layout: &'a UniformLayout,
    slots: Vec<[f32; 4]>,
}

impl<'a> UniformBlock<'a> {
    /// Create a zeroed block.
    pub fn new(layout: &'a UniformLayout) -> Self {
        Self {
            layout,
            slots: vec![[0.0; 4]; layout.len()],
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        self.layout
    }

    /// Packed slots, ready for upload.
    pub fn slots(&self) -> &[[f32; 4]] {
        &self.slots
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.layout.slot(name).map(|slot| self.slots[slot][0])
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        self.layout
            .slot(name)
            .map(|slot| Vec3::from_slice(&self.slots[slot][..3]))
    }

    fn write(&mut self, name: &str, ty: UniformType, value: [f32; 4]) {
        let Some(slot) = self.layout.slot(name) else {
            log::trace!("Uniform {} not in program layout", name);
            return;
        };
        let declared = self.layout.decls[slot].ty;
        if declared != ty {
            log::warn!("Uniform {} is {:?}, got {:?}", name, declared, ty);
            return;
        }
        self.slots[slot] = value;
    }
}

impl UniformSink for UniformBlock<'_> {
    fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformType::Float, [value, 0.0, 0.0, 0.0]);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformType::Vec3, value.extend(0.0).to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> UniformLayout {
        UniformLayout::new([
            UniformDecl::vec3("eye"),
            UniformDecl::float("time"),
            UniformDecl::vec3("eye"),
        ])
    }

    #[test]
    fn test_layout_slots() {
        let layout = layout();

        assert_eq!(layout.len(), 2);
        assert_eq!(layout.slot("eye"), Some(0));
        assert_eq!(layout.slot("time"), Some(1));
        assert_eq!(layout.slot("glossiness"), None);
        assert_eq!(layout.size_in_bytes(), 32);
    }

    #[test]
    fn test_layout_struct() {
        assert_eq!(
            layout().wgsl_struct(),
            "struct Uniforms {\n    eye: vec4<f32>,\n    time: vec4<f32>,\n}\n"
        );
    }

    #[test]
    fn test_block_packing() {
        let layout = layout();
        let mut block = UniformBlock::new(&layout);

        block.set_vec3("eye", Vec3::new(1.0, 2.0, 3.0));
        block.set_float("time", 4.5);
        // Unknown names and mismatched types are dropped
        block.set_float("missing", 1.0);
        block.set_float("eye", 9.0);

        assert_eq!(block.slots(), &[[1.0, 2.0, 3.0, 0.0], [4.5, 0.0, 0.0, 0.0]]);
        assert_eq!(block.vec3("eye"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(block.float("time"), Some(4.5));
    }
}
