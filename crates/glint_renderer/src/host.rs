//! The graphics host contract the accumulation renderer drives.

use glint_math::{Aabb, Mat4};

use crate::{ProgramSource, RenderResult, UniformBlock};

/// A device able to compile a tracing program and run it into float targets.
///
/// Programs and targets are opaque handles owned by the host. Calls are
/// synchronous and happen in the order the renderer issues them.
pub trait GraphicsHost {
    /// A compiled tracing program.
    type Program;
    /// A two-dimensional RGBA float render target.
    type Target;

    /// Compile a synthesized program.
    ///
    /// Fails with [`crate::RenderError::ShaderCompile`] carrying the host's
    /// diagnostic text.
    fn compile(&mut self, source: &ProgramSource) -> RenderResult<Self::Program>;

    /// Create a zero-initialized target.
    fn create_target(&mut self, width: u32, height: u32) -> RenderResult<Self::Target>;

    /// Run `program` once over the whole of `output`.
    ///
    /// The program reads `previous` and the uniform values, and writes the
    /// blended estimate into `output`. The two targets are never the same.
    fn accumulate(
        &mut self,
        program: &Self::Program,
        uniforms: &UniformBlock<'_>,
        previous: &Self::Target,
        output: &Self::Target,
    ) -> RenderResult<()>;

    /// Show `target` on screen.
    fn present(&mut self, target: &Self::Target) -> RenderResult<()>;

    /// Overlay the twelve edges of `bounds`, transformed by `view_projection`.
    fn draw_bounds(&mut self, bounds: &Aabb, view_projection: &Mat4) -> RenderResult<()>;

    /// Called once after the frame's present and overlay calls.
    fn end_frame(&mut self) -> RenderResult<()> {
        Ok(())
    }
}
