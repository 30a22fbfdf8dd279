//! Viewport error types.

use glint_renderer::RenderError;
use thiserror::Error;

/// Errors raised by the wgpu host.
#[derive(Error, Debug)]
pub enum ViewportError {
    #[error("Failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("Surface has no supported formats")]
    NoSurfaceFormat,

    #[error("Failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("No surface frame in progress")]
    NoFrame,
}

impl From<ViewportError> for RenderError {
    fn from(err: ViewportError) -> Self {
        RenderError::Host(err.to_string())
    }
}
