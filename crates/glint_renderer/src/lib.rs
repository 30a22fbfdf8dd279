//! Glint Renderer - progressive path tracing on any graphics host.
//!
//! The scene is turned into a single WGSL tracing program by the
//! [`synth`] module. [`AccumulationRenderer`] drives that program once per
//! frame on a [`GraphicsHost`], blending every new sample into a running
//! average held in two ping-pong targets.
//!
//! A CPU [`SoftwareHost`] runs the same accumulation contract without a GPU.

mod accumulation;
mod error;
mod host;
mod software;
pub mod synth;
mod uniforms;

pub use accumulation::{AccumulationRenderer, FrameOutcome, RendererConfig};
pub use error::{RenderError, RenderResult};
pub use host::GraphicsHost;
pub use software::{Image, SoftwareHost};
pub use synth::{synthesize, ProgramSource};
pub use uniforms::{UniformBlock, UniformLayout};
