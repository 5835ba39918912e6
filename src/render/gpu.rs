use std::collections::HashMap;

use log::{debug, error, warn};
use winit::dpi::PhysicalSize;

use super::backend::{FramebufferTarget, RenderBackend};
use super::camera::Camera;
use super::context::GpuContext;
use super::draw::{draw_list, DrawPass, DrawSource};
use super::mesh::{Mesh, MeshKey};
use super::pipeline::{RenderPipelines, Uniforms};
use super::scene::Scene;
use crate::xr::Viewport;

const MAX_INSTANCES: usize = 256;

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

struct DrawCall {
    mesh: Option<MeshKey>,
    pass: DrawPass,
    offset: u32,
}

/// [`RenderBackend`] drawing into a wgpu surface.
///
/// A frame's render passes share one command encoder and one dynamic uniform
/// buffer; every `render` call takes the next free slots so that all eyes
/// survive until the single submit in `finish_frame`. Binding a session layer
/// reconfigures the surface to the layer size.
pub struct WgpuBackend<'a> {
    context: GpuContext<'a>,
    pipelines: RenderPipelines,
    unlit_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    meshes: HashMap<MeshKey, Mesh>,
    environment: Option<(u64, Mesh)>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uniform_alignment: u32,
    next_instance: usize,
    frame: Option<Frame>,
    target: FramebufferTarget,
    window_size: (u32, u32),
    viewport: Viewport,
    auto_clear: bool,
    clear_color: wgpu::Color,
    pending_color_clear: bool,
    pending_depth_clear: bool,
}

impl<'a> WgpuBackend<'a> {
    pub fn new(context: GpuContext<'a>, clear_color: [f64; 4]) -> Self {
        let pipelines = RenderPipelines::new(&context);
        let unlit_pipeline = pipelines.create_unlit_pipeline(&context);
        let line_pipeline = pipelines.create_line_pipeline(&context);

        let uniform_alignment = context.device.limits().min_uniform_buffer_offset_alignment;
        let aligned_size = Self::align_to(std::mem::size_of::<Uniforms>() as u32, uniform_alignment);
        let buffer_size = (aligned_size as usize * MAX_INSTANCES) as u64;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Uniform Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = pipelines.create_dynamic_bind_group(&context.device, &uniform_buffer);

        let window_size = (context.size.width, context.size.height);
        let [r, g, b, a] = clear_color;

        Self {
            context,
            pipelines,
            unlit_pipeline,
            line_pipeline,
            meshes: HashMap::new(),
            environment: None,
            uniform_buffer,
            bind_group,
            uniform_alignment,
            next_instance: 0,
            frame: None,
            target: FramebufferTarget::Default,
            window_size,
            viewport: Viewport::full(window_size.0, window_size.1),
            auto_clear: true,
            clear_color: wgpu::Color { r, g, b, a },
            pending_color_clear: false,
            pending_depth_clear: false,
        }
    }

    pub fn context(&self) -> &GpuContext<'a> {
        &self.context
    }

    /// Window resize. Only reconfigures the surface while it shows the flat view.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.window_size = (size.width.max(1), size.height.max(1));
        if self.target == FramebufferTarget::Default {
            self.context.resize(size);
        }
    }

    fn align_to(size: u32, alignment: u32) -> u32 {
        (size + alignment - 1) & !(alignment - 1)
    }

    fn aligned_uniform_size(&self) -> u32 {
        Self::align_to(std::mem::size_of::<Uniforms>() as u32, self.uniform_alignment)
    }

    fn begin_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.surface.configure(&self.context.device, &self.context.config);
                return false;
            }
            Err(e) => {
                error!("Surface error: {:?}", e);
                return false;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        self.frame = Some(Frame { output, view, encoder });
        true
    }

    /// Uploads whatever meshes `source` needs that are not cached yet.
    fn prepare_mesh(&mut self, scene: &Scene, source: DrawSource) {
        let device = &self.context.device;
        match source {
            DrawSource::Shape { shape, wireframe } => {
                self.meshes
                    .entry(MeshKey::new(shape, wireframe))
                    .or_insert_with(|| Mesh::for_shape(device, shape, wireframe));
            }
            DrawSource::Environment(id) => {
                if self.environment.as_ref().map(|(cached, _)| *cached) == Some(id) {
                    return;
                }
                if let Some(panorama) = scene.environment() {
                    debug!("Baking panorama {} into a sphere of radius {}", id, panorama.radius());
                    self.environment = Some((id, Mesh::for_panorama(device, panorama)));
                }
            }
        }
    }

    fn load_ops(&self) -> (wgpu::LoadOp<wgpu::Color>, wgpu::LoadOp<f32>) {
        let color = if self.auto_clear || self.pending_color_clear {
            wgpu::LoadOp::Clear(self.clear_color)
        } else {
            wgpu::LoadOp::Load
        };
        let depth = if self.auto_clear || self.pending_depth_clear {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        (color, depth)
    }

    /// Viewport clipped to the configured surface, top-left origin.
    fn clipped_viewport(&self) -> Option<Viewport> {
        let (width, height) = (self.context.config.width, self.context.config.height);
        let x = self.viewport.x.min(width);
        let y = self.viewport.y.min(height);
        let clipped = Viewport::new(
            x,
            y,
            self.viewport.width.min(width - x),
            self.viewport.height.min(height - y),
        );
        (!clipped.is_empty()).then_some(clipped)
    }

    fn encode_pass(&mut self, calls: &[DrawCall]) {
        let (color_load, depth_load) = self.load_ops();
        let viewport = self.clipped_viewport();
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        {
            let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(vp) = viewport {
                render_pass.set_viewport(
                    vp.x as f32,
                    vp.y as f32,
                    vp.width as f32,
                    vp.height as f32,
                    0.0,
                    1.0,
                );

                let mut bound = None;
                for call in calls {
                    let mesh = match call.mesh {
                        Some(key) => self.meshes.get(&key),
                        None => self.environment.as_ref().map(|(_, mesh)| mesh),
                    };
                    let Some(mesh) = mesh else {
                        continue;
                    };
                    if bound != Some(call.pass) {
                        render_pass.set_pipeline(match call.pass {
                            DrawPass::Unlit => &self.unlit_pipeline,
                            DrawPass::Lit => &self.pipelines.pipeline,
                            DrawPass::Lines => &self.line_pipeline,
                        });
                        bound = Some(call.pass);
                    }
                    render_pass.set_bind_group(0, &self.bind_group, &[call.offset]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        self.pending_color_clear = false;
        self.pending_depth_clear = false;
    }
}

impl RenderBackend for WgpuBackend<'_> {
    fn surface_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        if self.frame.is_some() {
            debug!("Framebuffer rebound mid-frame, flushing");
            self.finish_frame();
        }
        self.target = target;
        let (width, height) = match target {
            FramebufferTarget::Default => self.window_size,
            FramebufferTarget::Layer { width, height } => (width, height),
        };
        self.context.resize(PhysicalSize::new(width.max(1), height.max(1)));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn clear(&mut self) {
        self.pending_color_clear = true;
        self.pending_depth_clear = true;
    }

    fn clear_depth(&mut self) {
        self.pending_depth_clear = true;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        if !self.begin_frame() {
            return;
        }

        let view_proj = camera.view_projection().to_cols_array_2d();
        let aligned_size = self.aligned_uniform_size() as usize;
        let first = self.next_instance;
        let mut uniform_data = Vec::new();
        let mut calls = Vec::new();

        for item in draw_list(scene) {
            if self.next_instance >= MAX_INSTANCES {
                warn!("Instance limit of {} reached, dropping remaining objects", MAX_INSTANCES);
                break;
            }
            self.prepare_mesh(scene, item.source);

            let uniforms = Uniforms {
                view_proj,
                model: item.model.to_cols_array_2d(),
                color: item.color,
            };
            let start = uniform_data.len();
            uniform_data.resize(start + aligned_size, 0u8);
            let bytes = bytemuck::bytes_of(&uniforms);
            uniform_data[start..start + bytes.len()].copy_from_slice(bytes);

            calls.push(DrawCall {
                mesh: item.source.mesh_key(),
                pass: item.pass,
                offset: (self.next_instance * aligned_size) as u32,
            });
            self.next_instance += 1;
        }

        if !uniform_data.is_empty() {
            self.context
                .queue
                .write_buffer(&self.uniform_buffer, (first * aligned_size) as u64, &uniform_data);
        }

        self.encode_pass(&calls);
    }

    fn finish_frame(&mut self) {
        if (self.pending_color_clear || self.pending_depth_clear) && self.begin_frame() {
            self.encode_pass(&[]);
        }
        if let Some(frame) = self.frame.take() {
            self.context.queue.submit(std::iter::once(frame.encoder.finish()));
            frame.output.present();
        }
        self.next_instance = 0;
    }
}
