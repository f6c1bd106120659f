//! searebbel - weather-driven ocean around a sailing boat
//!
//! Drag to orbit, scroll to zoom, arrow keys steer and trim speed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use searebbel::boat::RoutePlayback;
use searebbel::cli::Args;
use searebbel::error::OceanError;
use searebbel::ocean::{probe_grid, DisplacementProbe, SurfaceGrid};
use searebbel::params::OceanSurfaceParams;
use searebbel::rendering::RenderSystem;
use searebbel::scene::Scene;

/// Heading change per arrow key press (radians)
const STEER_STEP_RAD: f32 = 0.05;
const SPEED_STEP: f32 = 0.1;
/// Pixels per scroll line for touchpads
const PIXELS_PER_LINE: f32 = 40.0;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    scene: Scene,
    grid: SurfaceGrid,
    surface_params: OceanSurfaceParams,
    texture_dir: Option<PathBuf>,

    // Input
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,

    // Time tracking
    last_frame: Instant,

    /// Startup failure surfaced from `main`
    init_error: Option<OceanError>,
}

impl App {
    fn new(scene: Scene, grid: SurfaceGrid, texture_dir: Option<PathBuf>) -> Self {
        Self {
            window: None,
            render_system: None,
            scene,
            grid,
            surface_params: OceanSurfaceParams::default(),
            texture_dir,
            dragging: false,
            cursor: None,
            last_frame: Instant::now(),
            init_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), OceanError> {
        let config = self.scene.render_config();
        let window_attributes = Window::default_attributes()
            .with_title("searebbel")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_width,
                config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| OceanError::Surface(format!("failed to create window: {}", e)))?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.grid,
            self.surface_params.clone(),
            self.texture_dir.as_deref(),
        ))?;

        let (width, height) = render_system.size();
        self.scene.resize(width, height);

        log::info!(
            "Sea state '{}', sky '{}'",
            self.scene.weather().sea_state.name(),
            self.scene.weather().sky_state.name()
        );

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.last_frame = Instant::now();
        Ok(())
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt_s = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let frame = match self.scene.advance(dt_s) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Scene update failed: {}", e);
                return;
            }
        };

        match render_system.render(&frame) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("Startup failed: {}", e);
            self.init_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
                self.scene.resize(size.width.max(1), size.height.max(1));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.scene
                        .rotate_camera((position.x - last.x) as f32, (position.y - last.y) as f32);
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.scene.zoom_camera(lines);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::ArrowLeft => self.scene.steer_boat(STEER_STEP_RAD),
                KeyCode::ArrowRight => self.scene.steer_boat(-STEER_STEP_RAD),
                KeyCode::ArrowUp => {
                    let speed = self.scene.boat().speed + SPEED_STEP;
                    self.scene.boat_mut().set_speed(speed);
                }
                KeyCode::ArrowDown => {
                    let speed = self.scene.boat().speed - SPEED_STEP;
                    self.scene.boat_mut().set_speed(speed);
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

/// Run the GPU displacement probe against the host implementation
fn check_surface(scene: &mut Scene) -> Result<(), OceanError> {
    let frame = scene.advance(3.0)?;
    let probe = pollster::block_on(DisplacementProbe::new())?;
    let positions = probe_grid(25.0, 16);
    let report = pollster::block_on(probe.check(&positions, &frame.waves, &frame.displacement))?;

    println!(
        "Sea state '{}': {} samples, offset error {:.2e}, frame error {:.2e}",
        frame.waves.sea_state.name(),
        report.samples,
        report.max_offset_error,
        report.max_normal_error
    );

    if report.passed() {
        Ok(())
    } else {
        Err(OceanError::Probe(format!(
            "GPU and CPU displacement differ beyond {:.0e}",
            report.tolerance
        )))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let table = args.load_table()?;
    let weather = args.initial_weather(&table);

    let mut scene = Scene::new(table, weather, args.render_config(), args.camera_preset())?;
    scene.set_overrides(args.overrides())?;

    if args.check_surface {
        return Ok(check_surface(&mut scene)?);
    }

    if let Some(path) = &args.route {
        scene.set_route(RoutePlayback::load(path)?);
    }

    let grid = SurfaceGrid::new(&args.mesh_params());
    log::info!(
        "Surface mesh: {} cells per side over {} m",
        grid.cells_per_side(),
        grid.size_m()
    );

    let mut app = App::new(scene, grid, args.textures.clone());
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.init_error.take() {
        return Err(e.into());
    }
    Ok(())
}
