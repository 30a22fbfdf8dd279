//! Dirty-flag change tracking.
//!
//! Every scene mutator ORs one or more bits into the shared [`DirtyFlags`]
//! register. The renderer is the only consumer: once per frame it calls
//! [`DirtyFlags::take`], which evaluates both triggers and clears the register
//! in a single step. Bits set while no frame is rendered simply accumulate.

use bitflags::bitflags;

bitflags! {
    /// Categories of scene state changed since the last rendered frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        /// Objects were added, removed or replaced.
        const OBJECT_COUNT = 1 << 0;
        /// An object moved (committed or preview translation).
        const OBJECT_POSITION = 1 << 1;
        /// The material kind changed.
        const MATERIAL_TYPE = 1 << 2;
        /// A material parameter (glossiness) changed.
        const MATERIAL_PARAM = 1 << 3;
        /// The environment palette changed.
        const ENVIRONMENT = 1 << 4;
        /// The camera orbit or zoom changed.
        const CAMERA = 1 << 5;

        /// Changes that require resynthesizing the rendering program.
        const REBUILD = Self::OBJECT_COUNT.bits()
            | Self::MATERIAL_TYPE.bits()
            | Self::ENVIRONMENT.bits();
        /// Changes that only restart sample accumulation.
        const RESET_ACCUMULATION = Self::OBJECT_POSITION.bits()
            | Self::MATERIAL_PARAM.bits()
            | Self::CAMERA.bits();
    }
}

/// What the renderer must do this frame, derived from the dirty bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInvalidation {
    /// The program must be resynthesized (implies an accumulation restart).
    pub rebuild: bool,
    /// Accumulation must restart.
    pub reset: bool,
}

impl DirtyFlags {
    /// Mark one or more categories as changed.
    #[inline]
    pub fn mark(&mut self, bits: DirtyFlags) {
        self.insert(bits);
    }

    /// True if any rebuild trigger is set.
    pub fn needs_rebuild(&self) -> bool {
        self.intersects(Self::REBUILD)
    }

    /// True if any accumulation reset trigger is set.
    pub fn needs_reset(&self) -> bool {
        self.intersects(Self::RESET_ACCUMULATION)
    }

    /// Evaluate both triggers, then clear the whole register.
    ///
    /// Only the renderer calls this, exactly once per rendered frame.
    pub fn take(&mut self) -> FrameInvalidation {
        let invalidation = FrameInvalidation {
            rebuild: self.needs_rebuild(),
            reset: self.needs_reset(),
        };
        *self = DirtyFlags::empty();
        invalidation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_only_resets() {
        let mut flags = DirtyFlags::empty();
        flags.mark(DirtyFlags::CAMERA);

        assert!(flags.needs_reset());
        assert!(!flags.needs_rebuild());
    }

    #[test]
    fn test_rebuild_triggers() {
        for bit in [
            DirtyFlags::OBJECT_COUNT,
            DirtyFlags::MATERIAL_TYPE,
            DirtyFlags::ENVIRONMENT,
        ] {
            let mut flags = DirtyFlags::empty();
            flags.mark(bit);
            assert!(flags.needs_rebuild(), "{:?} should rebuild", bit);
            assert!(!flags.needs_reset(), "{:?} should not reset", bit);
        }
    }

    #[test]
    fn test_take_clears_once() {
        let mut flags = DirtyFlags::empty();
        flags.mark(DirtyFlags::OBJECT_POSITION);
        flags.mark(DirtyFlags::ENVIRONMENT);

        let first = flags.take();
        assert_eq!(first, FrameInvalidation { rebuild: true, reset: true });
        assert!(flags.is_empty());

        let second = flags.take();
        assert_eq!(second, FrameInvalidation::default());
    }

    #[test]
    fn test_bits_accumulate_between_frames() {
        let mut flags = DirtyFlags::empty();
        // Several ticks without a render
        flags.mark(DirtyFlags::CAMERA);
        flags.mark(DirtyFlags::MATERIAL_PARAM);
        flags.mark(DirtyFlags::OBJECT_COUNT);

        let invalidation = flags.take();
        assert!(invalidation.rebuild);
        assert!(invalidation.reset);
    }
}
