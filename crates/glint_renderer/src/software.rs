//! CPU implementation of [`GraphicsHost`].
//!
//! The software host runs the accumulation contract exactly as the GPU does
//! (per-pixel corner-ray interpolation, blend with the previous target at the
//! texture weight) but evaluates radiance with a caller-supplied function
//! instead of the synthesized program. Compilation performs a structural check
//! of the program text so rebuild paths can be exercised headless.

use std::fmt;

use glint_math::{Aabb, Mat4, Ray, Vec3};

use crate::{GraphicsHost, ProgramSource, RenderError, RenderResult, UniformBlock, UniformLayout};

/// Radiance estimate for a primary ray, given the frame's uniforms.
pub type RadianceFn = Box<dyn FnMut(&Ray, &UniformBlock<'_>) -> Vec3>;

/// A linear RGB float image, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    /// Average of all pixels.
    pub fn mean(&self) -> Vec3 {
        if self.pixels.is_empty() {
            return Vec3::ZERO;
        }
        self.pixels.iter().copied().sum::<Vec3>() / self.pixels.len() as f32
    }
}

/// Compiled form of a program on the software host.
#[derive(Debug, Clone)]
pub struct SoftwareProgram {
    layout: UniformLayout,
}

/// Handle to an image owned by the software host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareTarget(usize);

/// Headless host evaluating radiance on the CPU.
pub struct SoftwareHost {
    radiance: RadianceFn,
    images: Vec<Image>,
    presented: Option<usize>,
    bounds: Option<Aabb>,
    compile_count: usize,
}

impl fmt::Debug for SoftwareHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareHost")
            .field("images", &self.images.len())
            .field("presented", &self.presented)
            .field("compile_count", &self.compile_count)
            .finish()
    }
}

impl SoftwareHost {
    pub fn new(radiance: impl FnMut(&Ray, &UniformBlock<'_>) -> Vec3 + 'static) -> Self {
        Self {
            radiance: Box::new(radiance),
            images: Vec::new(),
            presented: None,
            bounds: None,
            compile_count: 0,
        }
    }

    /// A host whose every sample returns `color`.
    pub fn constant(color: Vec3) -> Self {
        Self::new(move |_, _| color)
    }

    /// The most recently presented image.
    pub fn presented(&self) -> Option<&Image> {
        self.presented.map(|index| &self.images[index])
    }

    pub fn image(&self, target: &SoftwareTarget) -> &Image {
        &self.images[target.0]
    }

    /// Bounds drawn by the last overlay call of the current frame.
    pub fn overlay(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Number of successful compilations.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }
}

/// Check entry points and that every `u.<name>` read is declared.
fn validate(source: &ProgramSource) -> Result<(), String> {
    for entry in ["fn vs_main(", "fn fs_main("] {
        if !source.source.contains(entry) {
            return Err(format!("missing entry point `{}`", entry.trim_end_matches('(')));
        }
    }

    let text = source.source.as_bytes();
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    for (start, _) in source.source.match_indices("u.") {
        if start > 0 && is_ident(text[start - 1]) {
            continue;
        }
        let name: String = source.source[start + 2..]
            .bytes()
            .take_while(|c| is_ident(*c))
            .map(char::from)
            .collect();
        if !source.layout.contains(&name) {
            return Err(format!("unknown uniform member `u.{}`", name));
        }
    }
    Ok(())
}

impl GraphicsHost for SoftwareHost {
    type Program = SoftwareProgram;
    type Target = SoftwareTarget;

    fn compile(&mut self, source: &ProgramSource) -> RenderResult<SoftwareProgram> {
        validate(source).map_err(|diagnostic| RenderError::ShaderCompile { diagnostic })?;
        self.compile_count += 1;
        Ok(SoftwareProgram {
            layout: source.layout.clone(),
        })
    }

    fn create_target(&mut self, width: u32, height: u32) -> RenderResult<SoftwareTarget> {
        self.images.push(Image::new(width, height));
        Ok(SoftwareTarget(self.images.len() - 1))
    }

    fn accumulate(
        &mut self,
        program: &SoftwareProgram,
        uniforms: &UniformBlock<'_>,
        previous: &SoftwareTarget,
        output: &SoftwareTarget,
    ) -> RenderResult<()> {
        if uniforms.layout() != &program.layout {
            return Err(RenderError::Host(
                "uniform block does not match program layout".to_string(),
            ));
        }

        let read = |name: &str| uniforms.vec3(name).unwrap_or(Vec3::ZERO);
        let eye = read("eye");
        let (ray00, ray01, ray10, ray11) = (read("ray00"), read("ray01"), read("ray10"), read("ray11"));
        let weight = uniforms.float("texture_weight").unwrap_or(0.0);

        let source = &self.images[previous.0];
        let (width, height) = (source.width, source.height);
        let radiance = &mut self.radiance;
        let mut pixels = Vec::with_capacity(source.pixels.len());
        for y in 0..height {
            // Row 0 is the top of the image, which is +1 in NDC
            let py = 1.0 - (y as f32 + 0.5) / height as f32;
            for x in 0..width {
                let px = (x as f32 + 0.5) / width as f32;
                let direction = ray00.lerp(ray01, py).lerp(ray10.lerp(ray11, py), px);
                let sample = radiance(&Ray::new(eye, direction), uniforms);
                pixels.push(sample.lerp(source.get(x, y), weight));
            }
        }

        let Some(target) = self.images.get_mut(output.0) else {
            return Err(RenderError::Host(format!("unknown target {}", output.0)));
        };
        target.pixels = pixels;
        Ok(())
    }

    fn present(&mut self, target: &SoftwareTarget) -> RenderResult<()> {
        self.presented = Some(target.0);
        self.bounds = None;
        Ok(())
    }

    fn draw_bounds(&mut self, bounds: &Aabb, _view_projection: &Mat4) -> RenderResult<()> {
        self.bounds = Some(*bounds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesize;
    use glint_core::{Environment, MaterialKind, Scene, Template};

    #[test]
    fn test_synthesized_program_validates() {
        let mut scene = Scene::new();
        scene.load_template(Template::CubeAndSpheres);
        let mut host = SoftwareHost::constant(Vec3::ONE);

        assert!(host.compile(&ProgramSource::from_scene(&scene)).is_ok());
        assert_eq!(host.compile_count(), 1);
    }

    #[test]
    fn test_unknown_uniform_rejected() {
        let mut program = synthesize(&[], MaterialKind::Diffuse, Environment::YellowBlue);
        program.source.push_str("fn extra() -> f32 { return u.missing_7.x; }\n");
        let mut host = SoftwareHost::constant(Vec3::ONE);

        match host.compile(&program) {
            Err(RenderError::ShaderCompile { diagnostic }) => {
                assert!(diagnostic.contains("u.missing_7"));
            }
            other => panic!("expected compile error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(host.compile_count(), 0);
    }

    #[test]
    fn test_image_mean() {
        let mut image = Image::new(2, 1);
        image.pixels = vec![Vec3::ZERO, Vec3::splat(2.0)];

        assert_eq!(image.mean(), Vec3::ONE);
        assert_eq!(image.get(1, 0), Vec3::splat(2.0));
    }
}
