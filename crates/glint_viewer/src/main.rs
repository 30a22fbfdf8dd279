use anyhow::Result;
use glint_core::{Picker, Scene, Template};
use glint_renderer::{AccumulationRenderer, FrameOutcome, RendererConfig};
use glint_viewport::Viewport;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Side length of the square accumulation targets.
const RESOLUTION: u32 = 512;
/// Glossiness change per bracket key press.
const GLOSSINESS_STEP: f32 = 0.1;
/// Zoom factor per wheel line.
const ZOOM_STEP: f32 = 0.9;

/// Application state
struct App {
    window: Option<Arc<Window>>,
    renderer: Option<AccumulationRenderer<Viewport>>,
    scene: Scene,
    picker: Picker,

    // Input state
    orbiting: bool,
    cursor_pos: (f32, f32),
    start_time: Instant,
}

impl App {
    fn new(template: Template) -> Self {
        let mut scene = Scene::new();
        scene.load_template(template);
        Self {
            window: None,
            renderer: None,
            scene,
            picker: Picker::with_viewport(RESOLUTION, RESOLUTION),
            orbiting: false,
            cursor_pos: (0.0, 0.0),
            start_time: Instant::now(),
        }
    }

    fn handle_key(&mut self, keycode: KeyCode) {
        let scene = &mut self.scene;
        match keycode {
            KeyCode::Delete | KeyCode::Backspace => {
                scene.delete_selection();
            }
            KeyCode::KeyS => {
                scene.add_sphere();
            }
            KeyCode::KeyC => {
                scene.add_cube();
            }
            KeyCode::KeyL => scene.select_light(),
            KeyCode::KeyM => {
                let kind = scene.material().kind().next();
                log::info!("Material: {}", kind);
                scene.set_material_kind(kind);
            }
            KeyCode::KeyE => {
                let environment = scene.environment().next();
                log::info!("Environment: {}", environment);
                scene.set_environment(environment);
            }
            KeyCode::BracketLeft => {
                let glossiness = scene.material().glossiness() - GLOSSINESS_STEP;
                scene.set_glossiness(glossiness);
            }
            KeyCode::BracketRight => {
                let glossiness = scene.material().glossiness() + GLOSSINESS_STEP;
                scene.set_glossiness(glossiness);
            }
            _ => {
                if let Some(template) = template_for_key(keycode) {
                    scene.load_template(template);
                }
            }
        }
    }

    fn render(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let time = self.start_time.elapsed().as_secs_f32();
        match renderer.render(&mut self.scene, time) {
            Ok(FrameOutcome::Rendered { rebuilt: true, .. }) => {
                log::debug!("Program rebuilt");
            }
            Ok(FrameOutcome::Rendered { .. }) => {}
            Ok(FrameOutcome::Halted) => {}
            Err(e) => log::error!("Render error: {}", e),
        }
    }
}

/// Number keys 1-6 load the canonical arrangements.
fn template_for_key(keycode: KeyCode) -> Option<Template> {
    let index = match keycode {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        _ => return None,
    };
    Template::ALL.get(index).copied()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Glint")
                .with_inner_size(winit::dpi::PhysicalSize::new(RESOLUTION, RESOLUTION));

            let window = Arc::new(
                event_loop
                    .create_window(window_attrs)
                    .expect("Failed to create window"),
            );

            // Initialize viewport (async in pollster block)
            let viewport = pollster::block_on(Viewport::new(window.clone()))
                .expect("Failed to initialize viewport");
            let (width, height) = viewport.size();
            self.picker.set_viewport(width, height);

            let config = RendererConfig::default().with_resolution(RESOLUTION, RESOLUTION);
            self.renderer = Some(AccumulationRenderer::new(viewport, config));
            self.window = Some(window);

            log::info!("Window and renderer initialized");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer
                        .host_mut()
                        .resize((physical_size.width, physical_size.height));
                    self.picker
                        .set_viewport(physical_size.width, physical_size.height);
                    log::info!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let (x, y) = self.cursor_pos;
                match state {
                    ElementState::Pressed => {
                        // Presses that miss everything orbit the camera
                        self.orbiting = !self.picker.pointer_down(&mut self.scene, x, y);
                    }
                    ElementState::Released => {
                        self.picker.pointer_up(&mut self.scene, x, y);
                        self.orbiting = false;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                let (last_x, last_y) = self.cursor_pos;
                self.cursor_pos = (x, y);

                if self.picker.is_dragging() {
                    self.picker.pointer_move(&mut self.scene, x, y);
                } else if self.orbiting {
                    self.scene.orbit_camera(x - last_x, y - last_y);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                let zoom = self.scene.camera().zoom() * ZOOM_STEP.powf(lines);
                self.scene.set_camera_zoom(zoom);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(keycode),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(keycode);
            }
            WindowEvent::RedrawRequested => {
                self.render();

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let template = match std::env::args().nth(1) {
        Some(name) => name.parse::<Template>()?,
        None => Template::SphereColumn,
    };

    log::info!("Starting Glint with {}", template);
    log::info!("Keys: S/C add, Delete remove, L light, M material, E environment, [ ] gloss, 1-6 templates");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(template);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
