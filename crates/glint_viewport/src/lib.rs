//! Glint Viewport - wgpu graphics host.
//!
//! [`Viewport`] owns the window surface and implements
//! [`glint_renderer::GraphicsHost`]: synthesized programs become render
//! pipelines, accumulation targets are `Rgba32Float` textures, and presenting
//! copies a target onto the surface before the selection wireframe is drawn.

mod error;
mod lines;

use std::sync::Arc;

use anyhow::Result;
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};

use glint_math::{Aabb, Mat4};
use glint_renderer::{GraphicsHost, ProgramSource, RenderError, RenderResult, UniformBlock};

pub use error::ViewportError;
use lines::LineOverlay;

/// Format of the accumulation targets.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// A compiled tracing program and its uniform buffer.
pub struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
}

/// An accumulation target.
pub struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuTarget {
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

struct PendingFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Window surface plus everything needed to run tracing programs on it.
pub struct Viewport {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    size: (u32, u32),

    tracer_bind_group_layout: wgpu::BindGroupLayout,
    tracer_pipeline_layout: wgpu::PipelineLayout,

    present_pipeline: wgpu::RenderPipeline,
    present_bind_group_layout: wgpu::BindGroupLayout,

    lines: LineOverlay,
    frame: Option<PendingFrame>,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            // Rgba32Float is not filterable without an extra feature
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn full_screen_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &'a str,
    view: &'a wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

impl Viewport {
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ViewportError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Glint Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // The tracer writes display values directly, so skip sRGB encoding
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(ViewportError::NoSurfaceFormat)?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let tracer_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Tracer Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    texture_entry(1),
                ],
            });
        let tracer_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tracer Pipeline Layout"),
            bind_group_layouts: &[&tracer_bind_group_layout],
            push_constant_ranges: &[],
        });

        let present_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Present Bind Group Layout"),
                entries: &[texture_entry(0)],
            });
        let present_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&present_bind_group_layout],
            push_constant_ranges: &[],
        });
        let present_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/present.wgsl").into()),
        });
        let present_pipeline = Self::full_screen_pipeline(
            &device,
            "Present Pipeline",
            &present_pipeline_layout,
            &present_shader,
            surface_format,
        );

        let lines = LineOverlay::new(&device, surface_format);

        log::info!(
            "Viewport ready: {}x{} {:?}",
            config.width,
            config.height,
            surface_format
        );

        Ok(Self {
            surface,
            device,
            queue,
            size: (config.width, config.height),
            config,
            tracer_bind_group_layout,
            tracer_pipeline_layout,
            present_pipeline,
            present_bind_group_layout,
            lines,
            frame: None,
        })
    }

    fn full_screen_pipeline(
        device: &Device,
        label: &str,
        layout: &wgpu::PipelineLayout,
        module: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn acquire_frame(&mut self) -> Result<(), ViewportError> {
        if self.frame.is_none() {
            let surface_texture = match self.surface.get_current_texture() {
                Ok(texture) => texture,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::warn!("Surface lost, reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                    self.surface.get_current_texture()?
                }
                Err(err) => return Err(err.into()),
            };
            let view = surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            self.frame = Some(PendingFrame {
                surface_texture,
                view,
            });
        }
        Ok(())
    }
}

impl GraphicsHost for Viewport {
    type Program = GpuProgram;
    type Target = GpuTarget;

    fn compile(&mut self, source: &ProgramSource) -> RenderResult<GpuProgram> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Tracer Shader"),
            source: wgpu::ShaderSource::Wgsl(source.source.as_str().into()),
        });
        let pipeline = Self::full_screen_pipeline(
            &self.device,
            "Tracer Pipeline",
            &self.tracer_pipeline_layout,
            &module,
            TARGET_FORMAT,
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                diagnostic: err.to_string(),
            });
        }

        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tracer Uniform Buffer"),
            size: source.layout.size_in_bytes() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(GpuProgram {
            pipeline,
            uniform_buffer,
        })
    }

    fn create_target(&mut self, width: u32, height: u32) -> RenderResult<GpuTarget> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Accumulation Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuTarget { texture, view })
    }

    fn accumulate(
        &mut self,
        program: &GpuProgram,
        uniforms: &UniformBlock<'_>,
        previous: &GpuTarget,
        output: &GpuTarget,
    ) -> RenderResult<()> {
        self.queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::cast_slice(uniforms.slots()));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Tracer Bind Group"),
            layout: &self.tracer_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: program.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&previous.view),
                },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Tracer Encoder"),
        });
        {
            let mut pass = full_screen_pass(&mut encoder, "Tracer Pass", &output.view);
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn present(&mut self, target: &GpuTarget) -> RenderResult<()> {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Present Bind Group"),
            layout: &self.present_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&target.view),
            }],
        });

        self.acquire_frame()?;
        let Some(frame) = self.frame.as_ref() else {
            return Err(ViewportError::NoFrame.into());
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Present Encoder"),
        });
        {
            let mut pass = full_screen_pass(&mut encoder, "Present Pass", &frame.view);
            pass.set_pipeline(&self.present_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn draw_bounds(&mut self, bounds: &Aabb, view_projection: &Mat4) -> RenderResult<()> {
        let frame = self.frame.as_ref().ok_or(ViewportError::NoFrame)?;
        self.lines
            .draw(&self.device, &self.queue, &frame.view, bounds, view_projection);
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        if let Some(frame) = self.frame.take() {
            frame.surface_texture.present();
        }
        Ok(())
    }
}
