use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use rtdemo_input::{Action, InputState};
use rtdemo_render_wgpu::{RaytraceRenderer, ShaderSource};
use rtdemo_scene::{Camera, Scene, SceneKind, shader_layout};
use rtdemo_uniforms::UniformBlock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "rtdemo-desktop", about = "Real-time ray tracing demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Built-in scene to start with
    #[arg(long, default_value_t = SceneKind::Room)]
    scene: SceneKind,

    /// Scene file (YAML or JSON) to add after the built-ins and start with
    #[arg(long)]
    scene_file: Option<PathBuf>,

    /// WGSL tracer body to use instead of the built-in one
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Orbit speed in radians per second
    #[arg(long, default_value_t = std::f32::consts::TAU / 60.0)]
    orbit_speed: f32,

    /// Fly speed in units per second
    #[arg(long, default_value_t = 4.0)]
    move_speed: f32,

    /// Turn speed in radians per second
    #[arg(long, default_value_t = 1.0)]
    turn_speed: f32,

    /// Start with the automatic orbit stopped
    #[arg(long)]
    no_orbit: bool,
}

#[derive(Debug, Clone, Copy)]
struct Controls {
    orbit_speed: f32,
    move_speed: f32,
    turn_speed: f32,
}

/// Application state, independent of the window and GPU.
struct AppState {
    scenes: Vec<Scene>,
    current: usize,
    camera: Camera,
    block: UniformBlock,
    input: InputState,
    controls: Controls,
    orbiting: bool,
    show_overlay: bool,
    size: (u32, u32),
    last_frame: Instant,
    fps: f32,
}

impl AppState {
    fn new(
        scenes: Vec<Scene>,
        current: usize,
        controls: Controls,
        orbiting: bool,
        size: (u32, u32),
    ) -> Self {
        let mut state = Self {
            scenes,
            current: 0,
            camera: Camera::default(),
            block: UniformBlock::new(Arc::new(shader_layout())),
            input: InputState::default(),
            controls,
            orbiting,
            show_overlay: true,
            size,
            last_frame: Instant::now(),
            fps: 0.0,
        };
        if !state.load_scene(current) {
            state.load_scene(0);
        }
        state
    }

    fn scene(&self) -> Option<&Scene> {
        self.scenes.get(self.current)
    }

    /// Replace every uniform with the scene at `index`.
    fn load_scene(&mut self, index: usize) -> bool {
        let Some(scene) = self.scenes.get(index) else {
            tracing::warn!("no scene in slot {}", index + 1);
            return false;
        };
        self.block.clear();
        scene.upload(&mut self.block);
        self.camera = scene.camera;
        self.current = index;
        tracing::info!("scene {} loaded", scene.name);
        self.resize(self.size.0, self.size.1);
        true
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.camera.set_aspect(width, height);
        self.camera.upload(&mut self.block);
    }

    fn reset_camera(&mut self) {
        if let Some(scene) = self.scenes.get(self.current) {
            self.camera = scene.camera;
            self.resize(self.size.0, self.size.1);
        }
    }

    fn update(&mut self, dt: f32) {
        if self.orbiting {
            self.camera.orbit(self.controls.orbit_speed * dt);
        }

        let boost = if self.input.is_held(KeyCode::ShiftLeft) {
            3.0
        } else {
            1.0
        };
        let step = self.controls.move_speed * boost * dt;
        let turn = self.controls.turn_speed * dt;

        for action in self.input.held_actions() {
            match action {
                Action::MoveForward => self.camera.move_local(step, 0.0, 0.0),
                Action::MoveBackward => self.camera.move_local(-step, 0.0, 0.0),
                Action::StrafeLeft => self.camera.move_local(0.0, -step, 0.0),
                Action::StrafeRight => self.camera.move_local(0.0, step, 0.0),
                Action::MoveUp => self.camera.move_local(0.0, 0.0, step),
                Action::MoveDown => self.camera.move_local(0.0, 0.0, -step),
                Action::YawLeft => self.camera.yaw(-turn),
                Action::YawRight => self.camera.yaw(turn),
                Action::PitchUp => self.camera.pitch(turn),
                Action::PitchDown => self.camera.pitch(-turn),
                _ => {}
            }
        }

        self.camera.upload(&mut self.block);

        if dt > 0.0 {
            let instant = 1.0 / dt;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps * 0.9 + instant * 0.1
            };
        }
    }

    /// One-shot actions that need no GPU access.
    fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleOrbit => {
                self.orbiting = !self.orbiting;
                tracing::info!("orbit {}", if self.orbiting { "on" } else { "off" });
            }
            Action::SelectScene(index) => {
                self.load_scene(index);
            }
            Action::ToggleOverlay => {
                self.show_overlay = !self.show_overlay;
            }
            Action::ResetCamera => self.reset_camera(),
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, shader_label: &str) {
        if !self.show_overlay {
            return;
        }

        let mut pick = None;
        egui::Window::new("Raytracing")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("{:.0} fps", self.fps));
                ui.label(format!("Shader: {shader_label}"));
                ui.separator();

                ui.heading("Scenes");
                for (i, scene) in self.scenes.iter().enumerate() {
                    let label = format!("{}: {}", i + 1, scene.name);
                    if ui.selectable_label(i == self.current, label).clicked() {
                        pick = Some(i);
                    }
                }
                if let Some(scene) = self.scene() {
                    ui.small(format!(
                        "{} triangles, {} spheres, {} pentagons",
                        scene.triangles.len(),
                        scene.spheres.len(),
                        scene.pentagons.len()
                    ));
                }
                ui.separator();

                ui.heading("Camera");
                let p = self.camera.position;
                ui.label(format!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!(
                    "Elevation: {:.1} deg",
                    self.camera.elevation().to_degrees()
                ));
                ui.checkbox(&mut self.orbiting, "Orbit (O)");
                if ui.button("Reset (Home)").clicked() {
                    self.reset_camera();
                }

                let unknown = self.block.reported().count();
                if unknown > 0 {
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("{unknown} uniform write(s) rejected, see log"),
                    );
                }

                ui.separator();
                ui.small("WASD/Space/Ctrl: Move | Q/E: Yaw | R/F: Pitch | Shift: Fast");
                ui.small("1-3: Scene | F1: Overlay | F5: Reload shader | Esc: Quit");
            });

        if let Some(index) = pick {
            self.load_scene(index);
        }
    }
}

/// Window and GPU resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: RaytraceRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        state: &mut AppState,
        shader: &ShaderSource,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Raytracing")
            .with_inner_size(PhysicalSize::new(state.size.0, state.size.1));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("rtdemo_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // The tracer writes display-ready colors, so skip the sRGB encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        state.resize(config.width, config.height);

        let renderer =
            RaytraceRenderer::new(&device, surface_format, state.block.layout().clone(), shader)?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend, {:?}",
            adapter.get_info().backend.to_str(),
            surface_format
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn reload_shader(&mut self, source: &ShaderSource) {
        match self.renderer.set_shader(&self.device, source) {
            Ok(()) => tracing::info!("shader {} reloaded", self.renderer.shader_label()),
            Err(e) => tracing::warn!(
                "keeping shader {} after failed reload: {e}",
                self.renderer.shader_label()
            ),
        }
    }

    fn draw(&mut self, egui_ctx: &EguiContext, state: &mut AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer
            .render(&self.device, &self.queue, &view, &mut state.block);

        let shader_label = self.renderer.shader_label().to_string();
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, &shader_label);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    shader: ShaderSource,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    /// Setup failure, reported from `main` after the loop exits.
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState, shader: ShaderSource) -> Self {
        Self {
            state,
            shader,
            gpu: None,
            egui_ctx: EguiContext::default(),
            error: None,
        }
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, action: Action) {
        match action {
            Action::Quit => event_loop.exit(),
            Action::ReloadShader => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.reload_shader(&self.shader);
                }
            }
            other => self.state.apply(other),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.egui_ctx, &mut self.state, &self.shader) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU setup failed: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let (width, height) = (new_size.width.max(1), new_size.height.max(1));
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(width, height);
                }
                self.state.resize(width, height);
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => match key_state {
                ElementState::Pressed => {
                    if let Some(action) = self.state.input.press(key) {
                        self.dispatch(event_loop, action);
                    }
                }
                ElementState::Released => self.state.input.release(key),
            },
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);

                if let Some(gpu) = &mut self.gpu {
                    gpu.draw(&self.egui_ctx, &mut self.state);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("rtdemo-desktop starting");

    let mut scenes: Vec<Scene> = SceneKind::ALL.into_iter().map(SceneKind::build).collect();
    let mut current = SceneKind::ALL
        .into_iter()
        .position(|k| k == cli.scene)
        .unwrap_or(0);
    if let Some(path) = &cli.scene_file {
        let scene = rtdemo_scene::io::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?;
        scenes.push(scene);
        current = scenes.len() - 1;
    }

    let controls = Controls {
        orbit_speed: cli.orbit_speed,
        move_speed: cli.move_speed,
        turn_speed: cli.turn_speed,
    };
    let state = AppState::new(
        scenes,
        current,
        controls,
        !cli.no_orbit,
        (cli.width.max(1), cli.height.max(1)),
    );
    let shader = cli.shader.map(ShaderSource::File).unwrap_or_default();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state, shader);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtdemo_uniforms::UniformValue;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-3;

    fn state(orbiting: bool) -> AppState {
        let scenes = SceneKind::ALL.into_iter().map(SceneKind::build).collect();
        let controls = Controls {
            orbit_speed: FRAC_PI_2,
            move_speed: 2.0,
            turn_speed: 1.0,
        };
        AppState::new(scenes, 0, controls, orbiting, (800, 600))
    }

    #[test]
    fn starts_with_the_requested_scene_uploaded() {
        let s = state(true);
        assert_eq!(s.block.get("triangles_used"), Some(UniformValue::Int(12)));
        assert_eq!(s.block.get("pentagons_used"), Some(UniformValue::Int(0)));
        assert_eq!(s.block.reported().count(), 0);
    }

    #[test]
    fn out_of_range_start_falls_back_to_first_scene() {
        let scenes = vec![SceneKind::Room.build()];
        let controls = Controls {
            orbit_speed: 0.0,
            move_speed: 1.0,
            turn_speed: 1.0,
        };
        let s = AppState::new(scenes, 5, controls, false, (800, 600));
        assert_eq!(s.current, 0);
    }

    #[test]
    fn switching_scene_replaces_geometry() {
        let mut s = state(false);
        s.apply(Action::SelectScene(1));
        assert_eq!(s.current, 1);
        assert_eq!(s.block.get("pentagons_used"), Some(UniformValue::Int(12)));

        s.apply(Action::SelectScene(7));
        assert_eq!(s.current, 1);
    }

    #[test]
    fn orbit_turns_about_world_y() {
        let mut s = state(true);
        let start = s.camera.position;
        s.update(1.0);
        let end = s.camera.position;
        assert!((end.length() - start.length()).abs() < EPS);
        assert!((end.y - start.y).abs() < EPS);
        assert!(start.dot(end).abs() < EPS * start.length_squared());
        assert_eq!(s.block.get("uCamera.position"), Some(UniformValue::Vec3(end)));
    }

    #[test]
    fn held_keys_fly_the_camera() {
        let mut s = state(false);
        let start = s.camera.position;
        let forward = s.camera.view.normalize();
        s.input.press(KeyCode::KeyW);
        s.update(0.5);
        assert!(s.camera.position.distance(start + forward) < EPS);

        s.input.press(KeyCode::ShiftLeft);
        let before = s.camera.position;
        s.update(0.5);
        assert!(s.camera.position.distance(before + forward * 3.0) < EPS);
    }

    #[test]
    fn resize_rewrites_scale() {
        let mut s = state(false);
        s.resize(1000, 500);
        assert_eq!(
            s.block.get("uCamera.scale"),
            Some(UniformValue::Vec2(glam::Vec2::new(2.0, 1.0)))
        );
    }

    #[test]
    fn reset_restores_scene_camera() {
        let mut s = state(false);
        s.camera.move_local(3.0, 0.0, 0.0);
        s.apply(Action::ResetCamera);
        assert_eq!(s.camera.position, s.scenes[0].camera.position);
        assert_eq!(s.camera.view, s.scenes[0].camera.view);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut s = state(true);
        s.apply(Action::ToggleOrbit);
        assert!(!s.orbiting);
        let before = s.camera.position;
        s.update(1.0);
        assert_eq!(s.camera.position, before);

        s.apply(Action::ToggleOverlay);
        assert!(!s.show_overlay);
        s.apply(Action::ToggleOverlay);
        assert!(s.show_overlay);
    }
}
