use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::input::InputState;
use crate::interaction::{Interaction, SceneView};
use crate::placement;
use crate::render::{Camera, Renderer, TextureWrap, Viewport, clear_color};
use crate::scene::{Scene, SurfaceRole};
use crate::settings::Settings;
use crate::texture::{LoadPurpose, Route, TextureLoader, TextureSource};
use crate::ui::{self, StatusInfo, UiAction};

const INITIAL_SIZE: (u32, u32) = (1280, 720);
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Top-level application state.
pub struct App {
    gpu: Option<GpuState>,
    settings: Settings,
    scene: Scene,
    camera: Camera,
    viewport: Viewport,
    input: InputState,
    interaction: Interaction,
    loader: TextureLoader,
}

/// Everything that requires the window to exist.
struct GpuState {
    window: Arc<Window>,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub fn new() -> Self {
        let settings = Settings::load();
        let (width, height) = INITIAL_SIZE;

        // Surface textures start decoding before the window exists.
        let mut loader = TextureLoader::new(&settings.textures.fallback);
        for role in SurfaceRole::ALL {
            let source = TextureSource::parse(settings.textures.default_for(role));
            loader.request(source, LoadPurpose::BuildSurface(role));
        }

        Self {
            gpu: None,
            scene: Scene::new(),
            camera: Camera::new(&settings.camera, width as f32, height as f32),
            viewport: Viewport::new(width, height, 1.0),
            input: InputState::new(settings.interaction.wheel_line_pixels),
            interaction: Interaction::new(settings.interaction.clone()),
            loader,
            settings,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let (width, height) = INITIAL_SIZE;
        let attrs = WindowAttributes::default()
            .with_title("Room Visualizer")
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attrs).expect("failed to create window"));

        let renderer = pollster::block_on(Renderer::new(window.clone()));

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&renderer.device, renderer.surface_format, None, 1, false);

        let size = window.inner_size();
        self.on_resize(size.width, size.height, window.scale_factor());

        self.gpu = Some(GpuState {
            window,
            renderer,
            egui_state,
            egui_renderer,
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gpu) = &mut self.gpu else { return };

        // Let egui process the event first
        let egui_response = gpu.egui_state.on_window_event(&gpu.window, &event);

        match &event {
            WindowEvent::CloseRequested => {
                self.settings.save();
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                let scale_factor = gpu.window.scale_factor();
                gpu.renderer.resize(size.width, size.height);
                self.on_resize(size.width, size.height, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // The new physical size arrives with the `Resized` that follows.
                self.viewport = self.viewport.with_scale_factor(*scale_factor);
            }
            WindowEvent::DroppedFile(path) => {
                self.drop_file(path.clone());
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                return;
            }
            _ => {}
        }

        if egui_response.consumed {
            self.input.observe(&event);
            return;
        }

        let Some(input) = self.input.translate(&event) else { return };
        let view = SceneView {
            camera: &self.camera,
            viewport: &self.viewport,
        };
        let outcome = self.interaction.handle(input, &mut self.scene, view);
        if outcome.redraw {
            self.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.apply_deliveries(event_loop);
        // Continuous render loop; FIFO present paces it to the display.
        self.request_redraw();
    }
}

impl App {
    fn request_redraw(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn on_resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        self.viewport = Viewport::new(width, height, scale_factor);
        self.camera.set_aspect(width as f32, height as f32);
        log::debug!("Viewport resized to {width}x{height} @ {scale_factor}");
    }

    /// Hand finished texture loads to the scene. Waits for the GPU since
    /// every delivery needs an upload.
    fn apply_deliveries(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else { return };
        let swap_repeat = self.settings.interaction.swap_texture_repeat;

        for delivery in self.loader.poll() {
            match delivery.route(&self.scene, swap_repeat) {
                Route::Surface { role, texture, wrap, repeat } => {
                    let handle = gpu.renderer.upload_texture(&texture.image, wrap);
                    self.scene.apply_surface_texture(role, handle, repeat);
                    log::info!("Textured {role} with {}{}", texture.image.label, fallback_note(texture.fell_back));
                }
                Route::Place { asset_id, anchor, texture } => {
                    let handle = gpu.renderer.upload_texture(&texture.image, TextureWrap::Clamp);
                    placement::place_item(&mut self.scene, &asset_id, handle, anchor, self.camera.position);
                }
                Route::Skip(role) => {
                    log::debug!("{role} was already textured by the user, keeping it");
                    continue;
                }
                Route::Exit { role, error } => {
                    log::error!("Cannot build {role}: {error}");
                    event_loop.exit();
                    return;
                }
                Route::Ignore { purpose, error } => {
                    log::warn!("Discarding failed load for {purpose:?}: {error}");
                    continue;
                }
            }
            gpu.window.request_redraw();
        }
    }

    /// Start loading `asset_id` for placement under `pointer`.
    fn place_asset(&mut self, asset_id: String, pointer: Vec2) {
        let Some(anchor) = placement::floor_anchor(pointer, &self.camera, &self.viewport) else {
            log::debug!("Drop at {pointer} misses the floor plane");
            return;
        };
        let source = placement::resolve_asset_source(&asset_id, &self.settings);
        self.loader.request(source, LoadPurpose::PlaceItem { asset_id, anchor });
    }

    fn drop_file(&mut self, path: PathBuf) {
        let pointer = self.input.drop_position(self.viewport.center());
        let Some(anchor) = placement::floor_anchor(pointer, &self.camera, &self.viewport) else {
            log::debug!("File drop at {pointer} misses the floor plane");
            return;
        };
        let asset_id = placement::asset_id_for_file(&path);
        self.loader.request(TextureSource::File(path), LoadPurpose::PlaceItem { asset_id, anchor });
    }

    fn import_texture(&mut self, role: SurfaceRole) {
        let file = rfd::FileDialog::new()
            .set_title(format!("Texture for {}", role.label().to_lowercase()))
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file();
        if let Some(path) = file {
            self.loader.request(TextureSource::File(path), LoadPurpose::Retexture(role));
        }
    }

    fn handle_ui_action(&mut self, action: UiAction) {
        match action {
            UiAction::None => {}
            UiAction::ImportTexture(role) => self.import_texture(role),
            UiAction::DropAsset { asset_id, pointer } => {
                let physical = pointer * self.viewport.scale_factor as f32;
                self.place_asset(asset_id, physical);
            }
            UiAction::PlaceAssetAtCenter(asset_id) => {
                let center = self.viewport.center();
                self.place_asset(asset_id, center);
            }
            UiAction::Menu(command) => {
                let outcome = self.interaction.menu_command(command, &mut self.scene);
                if outcome.redraw {
                    self.request_redraw();
                }
            }
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        if self.viewport.is_empty() {
            return;
        }

        let output = match gpu.renderer.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.window.inner_size();
                gpu.renderer.resize(size.width, size.height);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e}");
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Run egui
        let status = StatusInfo {
            state: self.interaction.state(),
            selected: self.interaction.selected(),
            dragging: self.interaction.is_dragging(),
            item_count: self.scene.item_count(),
            pending_loads: self.loader.pending(),
        };
        let raw_input = gpu.egui_state.take_egui_input(&gpu.window);
        let egui_ctx = gpu.egui_state.egui_ctx().clone();
        let mut ui_action = UiAction::None;
        let full_output = egui_ctx.run(raw_input, |ctx| {
            ui_action = ui::draw_ui(ctx, &self.settings.assets, &status, self.interaction.menu());
        });
        gpu.egui_state.handle_platform_output(&gpu.window, full_output.platform_output);

        // Scene changes from this frame's UI and input reach the GPU before drawing.
        gpu.renderer.sync_scene(&mut self.scene);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.renderer.config.width, gpu.renderer.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in &full_output.textures_delta.set {
            gpu.egui_renderer.update_texture(&gpu.renderer.device, &gpu.renderer.queue, *id, delta);
        }

        gpu.renderer.prepare_frame(&self.camera, &self.settings.display);

        // Main 3D render pass
        {
            let mut encoder = gpu
                .renderer
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("scene_encoder") });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("main_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color(&self.settings.display)),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &gpu.renderer.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });

                gpu.renderer.render_scene(&mut pass, &self.scene, self.camera.position);
            }
            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        // Egui render pass (separate encoder so egui owns the pass)
        {
            let mut encoder = gpu
                .renderer
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("egui_encoder") });

            gpu.egui_renderer.update_buffers(
                &gpu.renderer.device,
                &gpu.renderer.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            {
                let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
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
                });
                let mut pass = pass.forget_lifetime();
                gpu.egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }

            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        self.handle_ui_action(ui_action);
    }
}

fn fallback_note(fell_back: bool) -> &'static str {
    if fell_back { " (fallback)" } else { "" }
}
