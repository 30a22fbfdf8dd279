//! Renderer error types.

use thiserror::Error;

/// Errors that can occur while rendering a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The graphics host rejected the synthesized program.
    #[error("Shader compilation failed: {diagnostic}")]
    ShaderCompile { diagnostic: String },

    /// The graphics host failed outside of compilation.
    #[error("Graphics host error: {0}")]
    Host(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
