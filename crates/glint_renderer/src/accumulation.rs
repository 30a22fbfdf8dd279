//! Progressive accumulation of path-traced samples.
//!
//! Each frame renders one new sample per pixel and blends it into the running
//! average with weight `n / (n + 1)`, where `n` is the number of samples
//! already accumulated. After `k` undisturbed frames the presented target
//! holds the mean of `k` samples. Scene edits restart the average through the
//! dirty flags.

use glint_core::{Renderable, Scene, UniformSink};
use glint_math::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{GraphicsHost, ProgramSource, RenderResult, UniformBlock, UniformLayout};

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Accumulation target width in pixels
    pub width: u32,
    /// Accumulation target height in pixels
    pub height: u32,
    /// Seed for the sub-pixel jitter; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            seed: None,
        }
    }
}

impl RendererConfig {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// What happened during one call to [`AccumulationRenderer::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A sample was accumulated and presented.
    Rendered {
        /// The program was resynthesized this frame.
        rebuilt: bool,
        /// Accumulation restarted this frame (always true when rebuilt).
        reset: bool,
        /// Samples in the presented target.
        samples: u32,
    },
    /// No usable program exists; nothing is drawn until the next rebuild.
    Halted,
}

/// Owns the host, the active program and the two ping-pong targets.
pub struct AccumulationRenderer<H: GraphicsHost> {
    host: H,
    config: RendererConfig,
    rng: StdRng,
    program: Option<H::Program>,
    layout: UniformLayout,
    targets: Option<[H::Target; 2]>,
    /// Index of the target holding the current average.
    current: usize,
    sample_count: u32,
    /// A failed rebuild invalidated the average before it could be restarted.
    pending_reset: bool,
    halted: bool,
}

impl<H: GraphicsHost> AccumulationRenderer<H> {
    pub fn new(host: H, config: RendererConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            host,
            config,
            rng,
            program: None,
            layout: UniformLayout::default(),
            targets: None,
            current: 0,
            sample_count: 0,
            pending_reset: false,
            halted: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Samples accumulated in the presented target.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// The target holding the current average, once targets exist.
    pub fn current_target(&self) -> Option<&H::Target> {
        self.targets.as_ref().map(|targets| &targets[self.current])
    }

    /// Change the target resolution. Targets are recreated on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        let config = self.config.clone().with_resolution(width, height);
        if config == self.config {
            return;
        }
        log::info!("Accumulation targets resized to {}x{}", config.width, config.height);
        self.config = config;
        self.targets = None;
        self.sample_count = 0;
    }

    /// Render one frame of `scene` at `time` seconds since start.
    ///
    /// Consumes the scene's dirty flags exactly once. A compile failure is
    /// returned as [`crate::RenderError::ShaderCompile`]; the flags are already
    /// cleared, so it is not retried until the next rebuild trigger. The
    /// accumulation still restarts on the next frame drawn with the previous
    /// program.
    pub fn render(&mut self, scene: &mut Scene, time: f32) -> RenderResult<FrameOutcome> {
        let invalidation = scene.flags_mut().take();

        let needs_program = invalidation.rebuild || (self.program.is_none() && !self.halted);
        if needs_program {
            if let Err(err) = self.rebuild(scene) {
                self.sample_count = 0;
                self.pending_reset = true;
                return Err(err);
            }
        }
        let Some(program) = self.program.as_ref() else {
            return Ok(FrameOutcome::Halted);
        };

        let pending_reset = std::mem::take(&mut self.pending_reset);
        let reset = needs_program || invalidation.reset || pending_reset;
        if reset {
            if !needs_program {
                log::debug!("Accumulation reset after {} samples", self.sample_count);
            }
            self.sample_count = 0;
        }

        if self.targets.is_none() {
            let width = self.config.width;
            let height = self.config.height;
            let first = self.host.create_target(width, height)?;
            let second = self.host.create_target(width, height)?;
            log::info!("Created {}x{} accumulation targets", width, height);
            self.targets = Some([first, second]);
            self.current = 0;
            self.sample_count = 0;
        }
        let Some(targets) = self.targets.as_ref() else {
            return Ok(FrameOutcome::Halted);
        };

        let mut block = UniformBlock::new(&self.layout);
        for renderable in scene.renderables() {
            renderable.bind_uniforms(&mut block);
        }
        let camera = scene.camera();
        let inverse = jittered_inverse(
            &mut self.rng,
            camera.view_projection(),
            self.config.width,
            self.config.height,
        );
        block.set_vec3("eye", camera.eye());
        block.set_vec3("ray00", camera.eye_ray(&inverse, -1.0, -1.0));
        block.set_vec3("ray01", camera.eye_ray(&inverse, -1.0, 1.0));
        block.set_vec3("ray10", camera.eye_ray(&inverse, 1.0, -1.0));
        block.set_vec3("ray11", camera.eye_ray(&inverse, 1.0, 1.0));
        block.set_float("glossiness", scene.material().glossiness());
        block.set_float("time", time);
        block.set_float("texture_weight", texture_weight(self.sample_count));
        block.set_vec3(
            "resolution",
            Vec3::new(self.config.width as f32, self.config.height as f32, 0.0),
        );

        let previous = &targets[self.current];
        let output = &targets[1 - self.current];
        self.host.accumulate(program, &block, previous, output)?;
        self.current = 1 - self.current;
        self.sample_count += 1;

        self.host.present(&targets[self.current])?;
        if let Some(selected) = scene.selected_renderable() {
            self.host
                .draw_bounds(&selected.bounding_box(), &camera.view_projection())?;
        }
        self.host.end_frame()?;

        Ok(FrameOutcome::Rendered {
            rebuilt: needs_program,
            reset,
            samples: self.sample_count,
        })
    }

    fn rebuild(&mut self, scene: &Scene) -> RenderResult<()> {
        let source = ProgramSource::from_scene(scene);
        match self.host.compile(&source) {
            Ok(program) => {
                log::info!(
                    "Synthesized tracing program: {} renderables, {} uniforms, {} bytes",
                    scene.renderables().count(),
                    source.layout.len(),
                    source.source.len()
                );
                self.program = Some(program);
                self.layout = source.layout;
                self.halted = false;
                Ok(())
            }
            Err(err) => {
                log::error!("{}", err);
                if self.program.is_none() {
                    self.halted = true;
                }
                Err(err)
            }
        }
    }
}

/// Blend weight of the previous average when adding sample `n + 1`.
pub(crate) fn texture_weight(sample_count: u32) -> f32 {
    let n = sample_count as f32;
    n / (n + 1.0)
}

/// Inverse of the view-projection with a random sub-pixel clip-space shift.
///
/// The shift is uniform in [-1, 1] per axis, scaled by one pixel width.
fn jittered_inverse(rng: &mut StdRng, view_projection: Mat4, width: u32, height: u32) -> Mat4 {
    let jitter = Vec3::new(
        (rng.gen::<f32>() * 2.0 - 1.0) / width as f32,
        (rng.gen::<f32>() * 2.0 - 1.0) / height as f32,
        0.0,
    );
    (Mat4::from_translation(jitter) * view_projection).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderError, SoftwareHost};
    use glint_core::{Environment, MaterialKind};
    use glint_math::Aabb;

    /// Host that records every call instead of drawing.
    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
        weights: Vec<f32>,
        fail_compile: bool,
        compiles: u32,
        targets: u32,
    }

    impl GraphicsHost for RecordingHost {
        type Program = u32;
        type Target = u32;

        fn compile(&mut self, _source: &ProgramSource) -> RenderResult<u32> {
            if self.fail_compile {
                return Err(RenderError::ShaderCompile {
                    diagnostic: "error: unexpected token".to_string(),
                });
            }
            self.compiles += 1;
            self.calls.push("compile".to_string());
            Ok(self.compiles)
        }

        fn create_target(&mut self, _width: u32, _height: u32) -> RenderResult<u32> {
            self.targets += 1;
            Ok(self.targets - 1)
        }

        fn accumulate(
            &mut self,
            program: &u32,
            uniforms: &UniformBlock<'_>,
            previous: &u32,
            output: &u32,
        ) -> RenderResult<()> {
            self.weights.push(uniforms.float("texture_weight").unwrap_or(-1.0));
            self.calls
                .push(format!("accumulate p{} {}->{}", program, previous, output));
            Ok(())
        }

        fn present(&mut self, target: &u32) -> RenderResult<()> {
            self.calls.push(format!("present {}", target));
            Ok(())
        }

        fn draw_bounds(&mut self, _bounds: &Aabb, _view_projection: &Mat4) -> RenderResult<()> {
            self.calls.push("bounds".to_string());
            Ok(())
        }
    }

    fn recording() -> AccumulationRenderer<RecordingHost> {
        AccumulationRenderer::new(RecordingHost::default(), RendererConfig::default().with_seed(1))
    }

    fn software(host: SoftwareHost) -> AccumulationRenderer<SoftwareHost> {
        let config = RendererConfig::default().with_resolution(8, 8).with_seed(7);
        AccumulationRenderer::new(host, config)
    }

    #[test]
    fn test_texture_weight() {
        assert_eq!(texture_weight(0), 0.0);
        assert_eq!(texture_weight(1), 0.5);
        assert_eq!(texture_weight(3), 0.75);
    }

    #[test]
    fn test_config_builder() {
        let config = RendererConfig::default().with_resolution(0, 300).with_seed(9);

        assert_eq!(config.width, 1);
        assert_eq!(config.height, 300);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_first_frame_builds_program() {
        let mut renderer = recording();
        let mut scene = Scene::new();

        let outcome = renderer.render(&mut scene, 0.0).unwrap();

        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: true, reset: true, samples: 1 }
        );
        assert!(scene.flags().is_empty());
        assert_eq!(renderer.host().compiles, 1);
    }

    #[test]
    fn test_ping_pong_roles() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        for frame in 0..3 {
            renderer.render(&mut scene, frame as f32).unwrap();
        }

        let host = renderer.host();
        assert_eq!(
            host.calls,
            vec![
                "compile",
                "accumulate p1 0->1",
                "present 1",
                "accumulate p1 1->0",
                "present 0",
                "accumulate p1 0->1",
                "present 1",
            ]
        );
        assert_eq!(host.weights, vec![0.0, 0.5, 2.0 / 3.0]);
        assert_eq!(renderer.sample_count(), 3);
    }

    #[test]
    fn test_camera_change_resets_only() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();
        renderer.render(&mut scene, 0.1).unwrap();

        scene.orbit_camera(4.0, 0.0);
        let outcome = renderer.render(&mut scene, 0.2).unwrap();

        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: false, reset: true, samples: 1 }
        );
        assert_eq!(renderer.host().compiles, 1);
    }

    #[test]
    fn test_add_object_rebuilds() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();

        scene.add_cube();
        let outcome = renderer.render(&mut scene, 0.1).unwrap();

        assert!(matches!(outcome, FrameOutcome::Rendered { rebuilt: true, .. }));
        assert_eq!(renderer.host().compiles, 2);
    }

    #[test]
    fn test_compile_failure_without_program_halts() {
        let mut renderer = recording();
        renderer.host_mut().fail_compile = true;
        let mut scene = Scene::new();

        let err = renderer.render(&mut scene, 0.0).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { .. }));
        assert!(scene.flags().is_empty());

        // Not retried until the next rebuild trigger
        renderer.host_mut().fail_compile = false;
        assert_eq!(renderer.render(&mut scene, 0.1).unwrap(), FrameOutcome::Halted);
        scene.orbit_camera(1.0, 1.0);
        assert_eq!(renderer.render(&mut scene, 0.2).unwrap(), FrameOutcome::Halted);
        assert_eq!(renderer.host().compiles, 0);

        scene.add_sphere();
        let outcome = renderer.render(&mut scene, 0.3).unwrap();
        assert!(matches!(outcome, FrameOutcome::Rendered { rebuilt: true, samples: 1, .. }));
    }

    #[test]
    fn test_compile_failure_keeps_previous_program() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();

        renderer.host_mut().fail_compile = true;
        scene.add_sphere();
        assert!(renderer.render(&mut scene, 0.1).is_err());

        let outcome = renderer.render(&mut scene, 0.2).unwrap();
        assert!(matches!(outcome, FrameOutcome::Rendered { rebuilt: false, .. }));
        assert!(renderer.has_program());
        assert_eq!(renderer.host().calls.last().map(String::as_str), Some("present 0"));
    }

    #[test]
    fn test_failed_rebuild_still_resets() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        for frame in 0..3 {
            renderer.render(&mut scene, frame as f32).unwrap();
        }

        renderer.host_mut().fail_compile = true;
        scene.set_material_kind(MaterialKind::Mirror);
        scene.orbit_camera(40.0, 0.0);
        assert!(renderer.render(&mut scene, 3.0).is_err());
        assert_eq!(renderer.sample_count(), 0);

        renderer.host_mut().fail_compile = false;
        let outcome = renderer.render(&mut scene, 4.0).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: false, reset: true, samples: 1 }
        );
        assert_eq!(renderer.host().weights.last(), Some(&0.0));

        // Reset is applied once, then accumulation continues
        let outcome = renderer.render(&mut scene, 5.0).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: false, reset: false, samples: 2 }
        );
    }

    #[test]
    fn test_flags_accumulate_between_renders() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();
        renderer.render(&mut scene, 0.1).unwrap();

        // Several edits land before the next render
        scene.orbit_camera(2.0, 1.0);
        let light = scene.light().id();
        scene.translate(light, Vec3::new(0.0, -0.1, 0.0));
        scene.set_glossiness(0.2);
        let outcome = renderer.render(&mut scene, 0.2).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: false, reset: true, samples: 1 }
        );
        assert_eq!(renderer.host().compiles, 1);
        assert!(scene.flags().is_empty());

        scene.set_environment(Environment::RedGreen);
        scene.orbit_camera(-3.0, 0.0);
        let outcome = renderer.render(&mut scene, 0.3).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: true, reset: true, samples: 1 }
        );
        assert_eq!(renderer.host().compiles, 2);

        let outcome = renderer.render(&mut scene, 0.4).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered { rebuilt: false, reset: false, samples: 2 }
        );
    }

    #[test]
    fn test_selection_bounds_overlay() {
        let mut renderer = recording();
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();
        assert_ne!(renderer.host().calls.last().map(String::as_str), Some("bounds"));

        scene.select_light();
        renderer.render(&mut scene, 0.1).unwrap();
        assert_eq!(renderer.host().calls.last().map(String::as_str), Some("bounds"));
    }

    #[test]
    fn test_constant_radiance_converges() {
        let color = Vec3::new(0.2, 0.4, 0.8);
        let mut renderer = software(SoftwareHost::constant(color));
        let mut scene = Scene::new();

        for frame in 0..10 {
            renderer.render(&mut scene, frame as f32).unwrap();
        }

        let image = renderer.host().presented().unwrap();
        for pixel in image.pixels() {
            assert!((*pixel - color).abs().max_element() < 1e-6);
        }
    }

    #[test]
    fn test_presented_is_mean_of_samples() {
        let host = SoftwareHost::new(|_, uniforms| {
            Vec3::splat(uniforms.float("time").unwrap_or(0.0))
        });
        let mut renderer = software(host);
        let mut scene = Scene::new();

        for time in [1.0, 2.0, 3.0, 4.0] {
            renderer.render(&mut scene, time).unwrap();
        }

        let mean = renderer.host().presented().unwrap().mean();
        assert!((mean - Vec3::splat(2.5)).abs().max_element() < 1e-5);

        // Moving the camera discards the history
        scene.orbit_camera(0.0, 3.0);
        renderer.render(&mut scene, 7.0).unwrap();
        let mean = renderer.host().presented().unwrap().mean();
        assert!((mean - Vec3::splat(7.0)).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_primary_rays_cover_view() {
        let host = SoftwareHost::new(|ray, _| ray.direction.normalize());
        let mut renderer = software(host);
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();

        let image = renderer.host().presented().unwrap();
        // Camera looks down -Z from +Z; top-left looks up and left
        let top_left = image.get(0, 0);
        let bottom_right = image.get(7, 7);
        assert!(top_left.x < 0.0 && top_left.y > 0.0);
        assert!(bottom_right.x > 0.0 && bottom_right.y < 0.0);
        assert!(image.mean().z < 0.0);
    }

    #[test]
    fn test_resize_recreates_targets() {
        let mut renderer = software(SoftwareHost::constant(Vec3::ONE));
        let mut scene = Scene::new();
        renderer.render(&mut scene, 0.0).unwrap();
        renderer.render(&mut scene, 0.1).unwrap();

        renderer.resize(4, 2);
        let outcome = renderer.render(&mut scene, 0.2).unwrap();

        assert!(matches!(outcome, FrameOutcome::Rendered { samples: 1, .. }));
        let image = renderer.host().presented().unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
    }
}
