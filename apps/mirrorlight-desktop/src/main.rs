use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use egui::Context as EguiContext;
use mirrorlight_render::RenderError;
use mirrorlight_render_wgpu::WgpuBackend;
use mirrorlight_stage::{LightingScene, StageSettings, ViewportSize};
use mirrorlight_tools::SceneInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "mirrorlight-desktop", about = "Mirrorlight desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Stage settings file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Scene state plus HUD bookkeeping.
struct AppState {
    scene: LightingScene,
    show_hud: bool,
    last_frame: Instant,
    frame_ms: f32,
}

impl AppState {
    fn new(settings: &StageSettings) -> Self {
        Self {
            scene: LightingScene::new(settings),
            show_hud: true,
            last_frame: Instant::now(),
            frame_ms: 0.0,
        }
    }

    fn toggle_running(&mut self) {
        if self.scene.is_running() {
            self.scene.stop();
        } else {
            self.scene.start();
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => self.show_hud = !self.show_hud,
            KeyCode::Space => self.toggle_running(),
            _ => {}
        }
    }

    fn tick_clock(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        // Exponential smoothing keeps the readout legible.
        self.frame_ms += (dt - self.frame_ms) * 0.1;
    }

    fn draw_ui(&mut self, ctx: &EguiContext, uploaded_meshes: usize) {
        if !self.show_hud {
            return;
        }

        let summary = SceneInspector::summary(self.scene.graph());
        let camera = self.scene.camera().position;

        egui::Window::new("Mirrorlight")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Frame: {}  ({:.1} ms)",
                    self.scene.frame(),
                    self.frame_ms
                ));
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    camera.x, camera.y, camera.z
                ));
                ui.label(format!(
                    "Nodes: {}  Meshes: {}  Visible: {}",
                    summary.nodes, summary.meshes, summary.visible
                ));
                ui.label(format!("Uploaded geometries: {uploaded_meshes}"));
                ui.separator();

                let label = if self.scene.is_running() {
                    "Stop (Space)"
                } else {
                    "Start (Space)"
                };
                if ui.button(label).clicked() {
                    self.toggle_running();
                }

                ui.separator();
                ui.small("F1: Toggle HUD");
            });
    }
}

struct GpuApp {
    settings: StageSettings,
    state: AppState,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(settings: StageSettings) -> Self {
        Self {
            state: AppState::new(&settings),
            settings,
            window: None,
            backend: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            init_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Mirrorlight")
            .with_inner_size(PhysicalSize::new(
                self.settings.viewport_width,
                self.settings.viewport_height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let backend = WgpuBackend::attach(Arc::clone(&window));
        let mut backend = backend.context("attach renderer")?;

        let size = window.inner_size();
        self.state
            .scene
            .resize(&mut backend, ViewportSize::new(size.width, size.height))?;
        self.state.scene.start();

        let ctx = backend.context();
        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.format(), None, 1, false);

        self.window = Some(window);
        self.backend = Some(backend);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(backend), Some(window)) = (&mut self.backend, &self.window) else {
            return;
        };
        let inner = window.inner_size();
        let viewport = ViewportSize::from_client_areas(
            (new_size.width, new_size.height),
            (inner.width, inner.height),
        );
        if let Err(e) = self.state.scene.resize(backend, viewport) {
            tracing::error!("resize failed: {e}");
        }
    }

    fn redraw(&mut self) {
        self.state.tick_clock();

        let (Some(backend), Some(window), Some(egui_winit), Some(egui_renderer)) = (
            &mut self.backend,
            &self.window,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        ) else {
            return;
        };

        if let Err(e) = self.state.scene.advance_frame(backend) {
            match e {
                RenderError::SurfaceUnavailable(_) => tracing::error!("surface error: {e}"),
                _ => tracing::error!("render failed: {e}"),
            }
            return;
        }

        let raw_input = egui_winit.take_egui_input(window);
        let state = &mut self.state;
        let uploaded_meshes = backend.mesh_count();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, uploaded_meshes);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = backend.context().size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };
        let textures_delta = full_output.textures_delta;

        // Texture uploads happen even when the frame was skipped.
        let ctx = backend.context();
        for (id, image_delta) in &textures_delta.set {
            egui_renderer.update_texture(&ctx.device, &ctx.queue, *id, image_delta);
        }

        backend.present_with(|device, queue, view| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
            egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
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
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            queue.submit(std::iter::once(encoder.finish()));
        });
        for id in &textures_delta.free {
            egui_renderer.free_texture(id);
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("initialization failed: {e:#}");
            self.init_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.scene.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.state.handle_key(key),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let settings = match &cli.config {
        Some(path) => StageSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => StageSettings::default(),
    };

    tracing::info!("mirrorlight-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(settings);
    event_loop.run_app(&mut app)?;

    match app.init_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
