//! The interactive viewer: scene setup, toggle panel, input handling and the
//! main event loop.
//!
//! The viewer owns one instanced [`Model`], one wireframe box per instance and
//! a small 2D button panel. Each frame it pushes the camera matrices into the
//! model uniform, renders the instances, optionally the bounding boxes, and
//! the panel on top.
//!
//! # Lifecycle
//!
//! 1. [`run`] builds a winit event loop and hands it an [`App`]
//! 2. `resumed` creates the window, the GPU [`Context`] and the [`Viewer`]
//! 3. window events feed the orbit camera, the panel and the toggles
//! 4. `RedrawRequested` updates uniforms and draws the frame

use std::{iter, sync::Arc, time::SystemTime};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::{
        bounds::instance_aabbs,
        instance::{Instance, ScatterConfig, scatter},
        mesh::MeshData,
        model::{GpuMesh, Model},
        shapes,
        texture::Texture,
    },
    pipelines::{self, panel},
    resources,
};

const CLEAR_COLOUR: wgpu::Color = wgpu::Color {
    r: 0.3,
    g: 0.3,
    b: 0.4,
    a: 1.0,
};

/// What a panel button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ToggleInstances,
    ToggleInstanceColors,
    ToggleTexture,
    ToggleBoundingBoxes,
    Regenerate,
}

/// Axis-aligned rectangle in normalized device coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Rect {
    pub fn contains(&self, p: [f32; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }
}

/// Convert a cursor position in pixels to normalized device coordinates.
pub fn cursor_to_ndc(x: f32, y: f32, width: f32, height: f32) -> [f32; 2] {
    [2.0 * x / width - 1.0, 1.0 - 2.0 * y / height]
}

const BUTTON_ON: [f32; 3] = [0.2, 0.7, 0.3];
const BUTTON_OFF: [f32; 3] = [0.35, 0.35, 0.4];
const BUTTON_ACTION: [f32; 3] = [0.25, 0.45, 0.7];

/// The 2D toggle-button overlay in the top-left corner.
///
/// One quad per button, rebuilt into the vertex buffer each frame so a
/// button's colour tracks the toggle it controls.
struct Panel {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    buttons: Vec<(PanelAction, Rect)>,
}

impl Panel {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let actions = [
            PanelAction::ToggleInstances,
            PanelAction::ToggleInstanceColors,
            PanelAction::ToggleTexture,
            PanelAction::ToggleBoundingBoxes,
            PanelAction::Regenerate,
        ];
        let buttons = actions
            .iter()
            .enumerate()
            .map(|(i, action)| {
                let top = 0.95 - 0.11 * i as f32;
                let rect = Rect {
                    min: [-0.98, top - 0.08],
                    max: [-0.72, top],
                };
                (*action, rect)
            })
            .collect::<Vec<_>>();

        let mut indices: Vec<u16> = Vec::with_capacity(buttons.len() * 6);
        for i in 0..buttons.len() as u16 {
            let base = i * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        let index_buffer = {
            use wgpu::util::DeviceExt;
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        };
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Panel Vertex Buffer"),
            size: (buttons.len() * 4 * std::mem::size_of::<panel::Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline: pipelines::panel::mk_panel_pipeline(device, config),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            buttons,
        }
    }

    /// Rewrite the quad colours from the current toggle states.
    fn update(&self, queue: &wgpu::Queue, is_on: impl Fn(PanelAction) -> Option<bool>) {
        let mut vertices: Vec<panel::Vertex> = Vec::with_capacity(self.buttons.len() * 4);
        for (action, rect) in &self.buttons {
            let color = match is_on(*action) {
                Some(true) => BUTTON_ON,
                Some(false) => BUTTON_OFF,
                None => BUTTON_ACTION,
            };
            let corners = [
                [rect.min[0], rect.max[1]],
                [rect.min[0], rect.min[1]],
                [rect.max[0], rect.min[1]],
                [rect.max[0], rect.max[1]],
            ];
            for position in corners {
                vertices.push(panel::Vertex { position, color });
            }
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
    }

    /// The action under the cursor, if any.
    fn hit(&self, ndc: [f32; 2]) -> Option<PanelAction> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(ndc))
            .map(|(action, _)| *action)
    }

    fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Reduce a wheel delta to zoom steps. Vertical movement only; a purely
/// horizontal scroll maps to zero rather than a step.
fn scroll_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) if pos.y == 0.0 => 0.0,
        MouseScrollDelta::PixelDelta(pos) => pos.y.signum() as f32,
    }
}

/// Seed for a fresh scatter, taken from the wall clock.
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The scene: one instanced model, its bounding boxes and the panel.
pub struct Viewer {
    pub model: Model,
    boxes: Vec<GpuMesh>,
    wireframe_pipeline: wgpu::RenderPipeline,
    panel: Panel,
    pub show_bounding_boxes: bool,
    mesh: MeshData,
    instances: Vec<Instance>,
    scatter_config: ScatterConfig,
    cursor: [f32; 2],
    dragging: bool,
}

impl Viewer {
    /// Load the mesh and texture, scatter the instances and upload everything.
    ///
    /// With no model path the built-in sphere is used. The texture falls back
    /// to a procedural checkerboard when `assets/checker.png` is absent.
    pub async fn new(ctx: &Context, model_path: Option<&str>) -> anyhow::Result<Self> {
        let mesh_fut = async {
            match model_path {
                Some(name) => resources::load_model_obj(name).await,
                None => Ok(shapes::sphere(1.0, 10, 10).build()),
            }
        };
        let texture_fut =
            resources::texture::load_texture("checker.png", &ctx.device, &ctx.queue, Some("png"));
        let (mesh, texture) = futures::join!(mesh_fut, texture_fut);
        let mesh = mesh?;
        let texture = texture.unwrap_or_else(|_| {
            log::info!("assets/checker.png not found, using the procedural checkerboard");
            Texture::create_checkerboard(&ctx.device, &ctx.queue, 256, 8)
        });

        let scatter_config = ScatterConfig::default();
        let instances = scatter(&scatter_config, time_seed());

        let gpu_mesh = GpuMesh::upload(&ctx.device, &mesh, &instances)?;
        let model = Model::new(&ctx.device, &ctx.config, gpu_mesh, &texture);
        let boxes = upload_boxes(&ctx.device, &mesh, &instances)?;

        Ok(Self {
            model,
            boxes,
            wireframe_pipeline: pipelines::wireframe::mk_wireframe_pipeline(
                &ctx.device,
                &ctx.config,
            ),
            panel: Panel::new(&ctx.device, &ctx.config),
            show_bounding_boxes: false,
            mesh,
            instances,
            scatter_config,
            cursor: [0.0, 0.0],
            dragging: false,
        })
    }

    /// Throw a fresh set of instances and re-upload the mesh and its boxes.
    pub fn regenerate(&mut self, device: &wgpu::Device, seed: u64) -> anyhow::Result<()> {
        log::info!("regenerating instances with seed {seed}");
        self.instances = scatter(&self.scatter_config, seed);
        self.model.mesh = GpuMesh::upload(device, &self.mesh, &self.instances)?;
        self.boxes = upload_boxes(device, &self.mesh, &self.instances)?;
        Ok(())
    }

    /// Push the per-frame uniforms and the panel colours.
    pub fn update(&mut self, ctx: &Context) {
        let view = ctx.camera.view_matrix();
        let proj = ctx.projection.matrix();
        self.model.update(&ctx.queue, view, proj);

        let model = &self.model;
        let show_boxes = self.show_bounding_boxes;
        self.panel.update(&ctx.queue, |action| match action {
            PanelAction::ToggleInstances => Some(model.draw_instances),
            PanelAction::ToggleInstanceColors => Some(model.use_instance_colors),
            PanelAction::ToggleTexture => Some(model.use_texture),
            PanelAction::ToggleBoundingBoxes => Some(show_boxes),
            PanelAction::Regenerate => None,
        });
    }

    /// Draw the instances, the bounding boxes when enabled, and the panel.
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        self.model.draw(render_pass);

        if self.show_bounding_boxes {
            render_pass.set_pipeline(&self.wireframe_pipeline);
            render_pass.set_bind_group(0, &self.model.uniform_bind_group, &[]);
            if self.model.draw_instances {
                for bbox in &self.boxes {
                    bbox.draw(render_pass, false);
                }
            } else if let Some(bbox) = self.boxes.first() {
                bbox.draw(render_pass, false);
            }
        }

        self.panel.render(render_pass);
    }

    fn apply(&mut self, device: &wgpu::Device, action: PanelAction) -> anyhow::Result<()> {
        match action {
            PanelAction::ToggleInstances => {
                self.model.draw_instances = !self.model.draw_instances;
            }
            PanelAction::ToggleInstanceColors => {
                self.model.use_instance_colors = !self.model.use_instance_colors;
            }
            PanelAction::ToggleTexture => self.model.use_texture = !self.model.use_texture,
            PanelAction::ToggleBoundingBoxes => {
                self.show_bounding_boxes = !self.show_bounding_boxes;
            }
            PanelAction::Regenerate => self.regenerate(device, time_seed())?,
        }
        Ok(())
    }

    /// A left click either hits a panel button or starts a camera drag.
    fn handle_mouse_input(
        &mut self,
        ctx: &Context,
        button: MouseButton,
        pressed: bool,
    ) -> anyhow::Result<()> {
        if button != MouseButton::Left {
            return Ok(());
        }
        if !pressed {
            self.dragging = false;
            return Ok(());
        }
        let size = ctx.window.inner_size();
        let ndc = cursor_to_ndc(
            self.cursor[0],
            self.cursor[1],
            size.width as f32,
            size.height as f32,
        );
        match self.panel.hit(ndc) {
            Some(action) => self.apply(&ctx.device, action)?,
            None => self.dragging = true,
        }
        Ok(())
    }

    fn handle_cursor_moved(&mut self, ctx: &mut Context, x: f32, y: f32) {
        self.cursor = [x, y];
        if self.dragging {
            let size = ctx.window.inner_size();
            ctx.camera
                .handle_drag(x, y, size.width as f32, size.height as f32);
        }
    }

    fn handle_scroll(&mut self, ctx: &mut Context, delta: MouseScrollDelta) {
        let steps = scroll_steps(delta);
        if steps != 0.0 {
            ctx.camera.handle_scroll(steps);
        }
    }

    fn handle_key(&mut self, ctx: &Context, code: KeyCode) -> anyhow::Result<bool> {
        match code {
            KeyCode::Escape => return Ok(true),
            KeyCode::ArrowUp => self.model.shininess += 1.0,
            KeyCode::ArrowDown => self.model.shininess = (self.model.shininess - 1.0).max(0.0),
            KeyCode::KeyR => self.regenerate(&ctx.device, time_seed())?,
            _ => {}
        }
        Ok(false)
    }
}

/// Build the wireframe box resource for every instance. Each box carries a
/// single identity instance; its corners are already in world space.
fn upload_boxes(
    device: &wgpu::Device,
    mesh: &MeshData,
    instances: &[Instance],
) -> anyhow::Result<Vec<GpuMesh>> {
    instance_aabbs(mesh, instances)
        .iter()
        .map(|aabb| GpuMesh::upload(device, &aabb.wireframe().build(), &[Instance::identity()]))
        .collect()
}

/// GPU context, scene and surface status bundle.
struct AppState {
    ctx: Context,
    viewer: Viewer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, model_path: Option<&str>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let viewer = Viewer::new(&ctx, model_path).await?;
        Ok(Self {
            ctx,
            viewer,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.viewer.render(&mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    model_path: Option<String>,
    last_time: Instant,
    frames: u32,
}

impl App {
    fn new(model_path: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            state: None,
            model_path,
            last_time: Instant::now(),
            frames: 0,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("swarmview");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("Cannot create the main window: {}", e),
        };

        let model_path = self.model_path.as_deref();
        let state = self
            .async_runtime
            .block_on(AppState::new(window, model_path));
        match state {
            Ok(state) => self.state = Some(state),
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.frames += 1;
                if self.frames % 240 == 0 {
                    log::debug!("frame time {:?}", dt);
                }

                state.viewer.update(&state.ctx);
                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Err(e) =
                    state
                        .viewer
                        .handle_mouse_input(&state.ctx, button, button_state.is_pressed())
                {
                    log::error!("{}", e);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                state
                    .viewer
                    .handle_cursor_moved(&mut state.ctx, position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                state.viewer.handle_scroll(&mut state.ctx, delta);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match state.viewer.handle_key(&state.ctx, code) {
                Ok(true) => event_loop.exit(),
                Ok(false) => {}
                Err(e) => log::error!("{}", e),
            },
            _ => {}
        }
    }
}

/// Start the viewer, optionally loading an OBJ from `assets/<model_path>`.
pub fn run(model_path: Option<String>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(model_path)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_center_maps_to_ndc_origin() {
        let ndc = cursor_to_ndc(400.0, 300.0, 800.0, 600.0);
        assert_eq!(ndc, [0.0, 0.0]);
    }

    #[test]
    fn cursor_corners_map_to_ndc_corners() {
        assert_eq!(cursor_to_ndc(0.0, 0.0, 800.0, 600.0), [-1.0, 1.0]);
        assert_eq!(cursor_to_ndc(800.0, 600.0, 800.0, 600.0), [1.0, -1.0]);
    }

    #[test]
    fn horizontal_scroll_is_not_a_zoom_step() {
        use winit::dpi::PhysicalPosition;

        assert_eq!(
            scroll_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(12.0, 0.0))),
            0.0
        );
        assert_eq!(scroll_steps(MouseScrollDelta::LineDelta(3.0, 0.0)), 0.0);
        assert_eq!(
            scroll_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -8.0))),
            -1.0
        );
        assert_eq!(scroll_steps(MouseScrollDelta::LineDelta(0.0, 1.0)), 1.0);
    }

    #[test]
    fn rect_contains_its_interior_and_edges() {
        let rect = Rect {
            min: [-0.5, -0.5],
            max: [0.5, 0.5],
        };
        assert!(rect.contains([0.0, 0.0]));
        assert!(rect.contains([-0.5, 0.5]));
        assert!(!rect.contains([0.6, 0.0]));
        assert!(!rect.contains([0.0, -0.6]));
    }
}
