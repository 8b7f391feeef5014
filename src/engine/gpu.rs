use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::gpu_context::GpuContext;
use super::types::{GlobalsUniform, ObjectUniform};
use super::Engine;
use crate::error::{EngineError, MountError};
use crate::host::surface::{RenderSurface, Viewport};
use crate::scene::material::{BlendMode, Material, MaterialKind, ShaderSource};
use crate::scene::mesh::{Mesh, Vertex};
use crate::scene::post_process::PostProcess;
use crate::scene::{Disposed, MeshId, PostProcessId, Scene};

/// Background behind every scene
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const PRELUDE: &str = include_str!("shaders/prelude.wgsl");
const FULLSCREEN: &str = include_str!("shaders/fullscreen.wgsl");

const STANDARD_SHADER: ShaderSource = ShaderSource {
    label: "standard",
    wgsl: include_str!("shaders/standard.wgsl"),
};

/// The canvas area of the application window.
///
/// The shell updates the region every UI pass; until it does, the whole
/// window is drawable.
#[derive(Clone)]
pub struct CanvasSurface {
    window: Arc<Window>,
    region: Rc<Cell<Option<Viewport>>>,
}

impl CanvasSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            region: Rc::new(Cell::new(None)),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn set_region(&self, region: Viewport) {
        self.region.set(Some(region));
    }
}

impl RenderSurface for CanvasSurface {
    fn drawable_region(&self) -> Option<Viewport> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return None;
        }
        Some(match self.region.get() {
            Some(region) => region.clamp_to(size.width, size.height),
            None => Viewport::full(size.width, size.height),
        })
    }
}

/// Tessellated egui output composited over the scene
pub struct EguiPaint {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct PassBinding {
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Shader labels identify pipelines; two sources must not share a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: &'static str,
    blend: BlendMode,
    cull: bool,
    depth_bias: i32,
    fullscreen: bool,
}

impl PipelineKey {
    fn for_material(material: Option<&Material>) -> (Self, ShaderSource) {
        match material.map(|m| (&m.kind, m.blend())) {
            Some((MaterialKind::Shader(shader), blend)) => (
                Self {
                    shader: shader.shader.label,
                    blend,
                    cull: shader.back_face_culling,
                    depth_bias: shader.depth_bias,
                    fullscreen: false,
                },
                shader.shader,
            ),
            Some((MaterialKind::Standard(_), blend)) => (Self::standard(blend), STANDARD_SHADER),
            None => (Self::standard(BlendMode::Opaque), STANDARD_SHADER),
        }
    }

    fn standard(blend: BlendMode) -> Self {
        Self {
            shader: STANDARD_SHADER.label,
            blend,
            cull: true,
            depth_bias: 0,
            fullscreen: false,
        }
    }

    fn for_post_process(post: &PostProcess) -> Self {
        Self {
            shader: post.shader.label,
            blend: post.blend,
            cull: false,
            depth_bias: 0,
            fullscreen: true,
        }
    }
}

pub struct GpuEngine {
    canvas: CanvasSurface,
    target: Option<wgpu::Surface<'static>>,
    gpu: GpuContext,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    viewport: Viewport,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    globals_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    meshes: HashMap<MeshId, MeshBuffers>,
    post_passes: HashMap<PostProcessId, PassBinding>,
    egui_renderer: egui_wgpu::Renderer,
}

impl GpuEngine {
    async fn init(canvas: CanvasSurface, viewport: Viewport) -> Result<Self, MountError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let target = instance
            .create_surface(Arc::clone(canvas.window()))
            .map_err(|e| MountError::CreateSurface(e.to_string()))?;
        let (gpu, adapter) = GpuContext::for_surface(&instance, &target).await?;

        let size = canvas.window().inner_size();
        let config = Self::create_surface_config(&target, &adapter, size.width, size.height)?;
        target.configure(gpu.device(), &config);

        let device = gpu.device();
        let depth_view = Self::create_depth_view(device, config.width, config.height);

        let globals_layout = Self::uniform_layout(device, "globals_layout");
        let object_layout = Self::uniform_layout(device, "object_layout");

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let egui_renderer = egui_wgpu::Renderer::new(device, config.format, egui_wgpu::RendererOptions::default());

        log::info!(
            "gpu engine ready: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            canvas,
            target: Some(target),
            gpu,
            config,
            depth_view,
            viewport,
            globals_buffer,
            globals_bind_group,
            globals_layout,
            object_layout,
            pipelines: HashMap::new(),
            meshes: HashMap::new(),
            post_passes: HashMap::new(),
            egui_renderer,
        })
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<wgpu::SurfaceConfiguration, MountError> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| MountError::CreateSurface("surface is not supported by the adapter".into()))?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    /// Reconfigure after the window changed size or the surface was lost
    fn reconfigure(&mut self) {
        let size = self.canvas.window().inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        if let Some(target) = &self.target {
            target.configure(self.gpu.device(), &self.config);
        }
        self.depth_view = Self::create_depth_view(self.gpu.device(), size.width, size.height);
    }

    fn create_pipeline(&self, key: PipelineKey, source: ShaderSource) -> wgpu::RenderPipeline {
        let device = self.gpu.device();
        log::debug!("compiling pipeline {:?}", key);

        let code = if key.fullscreen {
            format!("{PRELUDE}\n{FULLSCREEN}\n{}", source.wgsl)
        } else {
            format!("{PRELUDE}\n{}", source.wgsl)
        };
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(code.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(source.label),
            bind_group_layouts: &[&self.globals_layout, &self.object_layout],
            push_constant_ranges: &[],
        });

        let vertex_layouts = [Vertex::layout()];
        let (entry_point, buffers): (&str, &[wgpu::VertexBufferLayout]) = if key.fullscreen {
            ("vs_fullscreen", &[])
        } else {
            ("vs_main", &vertex_layouts)
        };

        let blend = match key.blend {
            BlendMode::Opaque => wgpu::BlendState::REPLACE,
            BlendMode::AlphaCombine => wgpu::BlendState::ALPHA_BLENDING,
        };

        let depth_stencil = (!key.fullscreen).then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.blend == BlendMode::Opaque,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: key.depth_bias,
                slope_scale: 0.0,
                clamp: 0.0,
            },
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(source.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(entry_point),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn ensure_pipeline(&mut self, key: PipelineKey, source: ShaderSource) {
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(key, source);
            self.pipelines.insert(key, pipeline);
        }
    }

    fn uniform_binding(&self, label: &str) -> (wgpu::Buffer, wgpu::BindGroup) {
        let device = self.gpu.device();
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });
        (uniform, bind_group)
    }

    fn upload_mesh(&self, mesh: &Mesh) -> MeshBuffers {
        let device = self.gpu.device();
        let geometry = mesh.geometry();

        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&mesh.name),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&mesh.name),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let (uniform, bind_group) = self.uniform_binding(&mesh.name);

        log::trace!("uploaded mesh '{}' ({} triangles)", mesh.name, geometry.triangle_count());

        MeshBuffers {
            vertex,
            index,
            index_count: geometry.indices.len() as u32,
            uniform,
            bind_group,
        }
    }

    /// Upload uniforms and whatever the scene added since the last frame.
    /// Returns draw lists: meshes (opaque first) and post-processes.
    fn prepare(
        &mut self,
        scene: &Scene,
        viewport: Viewport,
    ) -> (Vec<(MeshId, PipelineKey)>, Vec<(PostProcessId, PipelineKey)>) {
        let globals = GlobalsUniform::from_scene(scene, viewport);
        self.gpu
            .queue()
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut opaque = Vec::new();
        let mut blended = Vec::new();

        for mesh in scene.meshes().filter(|m| m.visible) {
            if mesh.geometry().indices.is_empty() {
                continue;
            }
            let material = mesh.material.and_then(|id| scene.material(id));
            let (key, source) = PipelineKey::for_material(material);
            self.ensure_pipeline(key, source);

            if !self.meshes.contains_key(&mesh.id()) {
                let buffers = self.upload_mesh(mesh);
                self.meshes.insert(mesh.id(), buffers);
            }
            if let Some(buffers) = self.meshes.get(&mesh.id()) {
                let object = ObjectUniform::for_mesh(mesh, material);
                self.gpu
                    .queue()
                    .write_buffer(&buffers.uniform, 0, bytemuck::bytes_of(&object));
            }

            match key.blend {
                BlendMode::Opaque => opaque.push((mesh.id(), key)),
                BlendMode::AlphaCombine => blended.push((mesh.id(), key)),
            }
        }
        opaque.extend(blended);

        let mut posts = Vec::new();
        for post in scene.post_processes().filter(|p| p.enabled) {
            let key = PipelineKey::for_post_process(post);
            self.ensure_pipeline(key, post.shader);

            if !self.post_passes.contains_key(&post.id()) {
                let (uniform, bind_group) = self.uniform_binding(&post.name);
                self.post_passes.insert(post.id(), PassBinding { uniform, bind_group });
            }
            if let Some(binding) = self.post_passes.get(&post.id()) {
                let object = ObjectUniform::for_params(post.params.slots());
                self.gpu
                    .queue()
                    .write_buffer(&binding.uniform, 0, bytemuck::bytes_of(&object));
            }
            posts.push((post.id(), key));
        }

        (opaque, posts)
    }

    fn set_viewport(pass: &mut wgpu::RenderPass<'_>, viewport: Viewport) {
        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        pass.set_scissor_rect(viewport.x, viewport.y, viewport.width, viewport.height);
    }

    /// Draw scene, post-processes and chrome. Texture deltas are handled by the caller.
    fn draw_frame(&mut self, scene: &Scene, chrome: Option<&EguiPaint>) -> Result<(), EngineError> {
        let acquired = match &self.target {
            Some(target) => target.get_current_texture(),
            None => return Err(EngineError::Disposed),
        };
        let output = match acquired {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let viewport = self.viewport.clamp_to(self.config.width, self.config.height);
        let (draws, posts) = self.prepare(scene, viewport);

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !viewport.is_empty() {
                Self::set_viewport(&mut render_pass, viewport);
                render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

                for (id, key) in &draws {
                    let (Some(pipeline), Some(buffers)) = (self.pipelines.get(key), self.meshes.get(id)) else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, &buffers.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                    render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                }
            }
        }

        if !viewport.is_empty() && !posts.is_empty() {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Post-process Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            Self::set_viewport(&mut render_pass, viewport);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

            for (id, key) in &posts {
                let (Some(pipeline), Some(binding)) = (self.pipelines.get(key), self.post_passes.get(id)) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &binding.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        let mut command_buffers = Vec::new();
        if let Some(paint) = chrome {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: paint.pixels_per_point,
            };
            command_buffers = self.egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &paint.primitives,
                &screen_descriptor,
            );

            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &paint.primitives, &screen_descriptor);
        }

        queue.submit(command_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }
}

/// Apply the `set` half of an egui texture delta
fn upload_textures(renderer: &mut egui_wgpu::Renderer, gpu: &GpuContext, delta: &egui::TexturesDelta) {
    for (id, image_delta) in &delta.set {
        renderer.update_texture(gpu.device(), gpu.queue(), *id, image_delta);
    }
}

/// Apply the `free` half of an egui texture delta
fn free_textures(renderer: &mut egui_wgpu::Renderer, delta: &egui::TexturesDelta) {
    for id in &delta.free {
        renderer.free_texture(id);
    }
}

impl Engine for GpuEngine {
    type Surface = CanvasSurface;
    type Chrome = EguiPaint;

    fn create(surface: CanvasSurface) -> Result<Self, MountError> {
        let viewport = surface
            .drawable_region()
            .filter(|region| !region.is_empty())
            .ok_or(MountError::InvalidSurface)?;
        pollster::block_on(Self::init(surface, viewport))
    }

    fn surface(&self) -> &CanvasSurface {
        &self.canvas
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let size = self.canvas.window().inner_size();
        if size.width != self.config.width || size.height != self.config.height {
            self.reconfigure();
        }
    }

    fn render(&mut self, scene: &Scene, chrome: Option<&EguiPaint>) -> Result<(), EngineError> {
        // egui hands each delta out once, so it must land even when no frame is drawn
        if let Some(paint) = chrome {
            upload_textures(&mut self.egui_renderer, &self.gpu, &paint.textures_delta);
        }
        let drawn = self.draw_frame(scene, chrome);
        if let Some(paint) = chrome {
            free_textures(&mut self.egui_renderer, &paint.textures_delta);
        }
        drawn
    }

    fn release(&mut self, disposed: &[Disposed]) {
        let mut freed = 0;
        for item in disposed {
            match item {
                Disposed::Mesh(id) => {
                    if let Some(buffers) = self.meshes.remove(id) {
                        buffers.vertex.destroy();
                        buffers.index.destroy();
                        buffers.uniform.destroy();
                        freed += 1;
                    }
                }
                Disposed::PostProcess(id) => {
                    if let Some(binding) = self.post_passes.remove(id) {
                        binding.uniform.destroy();
                        freed += 1;
                    }
                }
                _ => {}
            }
        }
        if freed > 0 {
            log::debug!("released gpu resources for {} object(s)", freed);
        }
    }

    fn dispose(&mut self) {
        for (_, buffers) in self.meshes.drain() {
            buffers.vertex.destroy();
            buffers.index.destroy();
            buffers.uniform.destroy();
        }
        for (_, binding) in self.post_passes.drain() {
            binding.uniform.destroy();
        }
        self.pipelines.clear();
        self.globals_buffer.destroy();
        self.target = None;
        log::info!("gpu engine disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::{ShaderMaterial, StandardMaterial};
    use crate::scene::MaterialId;

    const GLOW: ShaderSource = ShaderSource {
        label: "glow",
        wgsl: "",
    };

    fn material(kind: MaterialKind) -> Material {
        Material {
            id: MaterialId(0),
            name: "m".to_string(),
            kind,
        }
    }

    #[test]
    fn test_standard_materials_share_pipeline() {
        let plain = material(MaterialKind::Standard(StandardMaterial::default()));
        let (with_material, _) = PipelineKey::for_material(Some(&plain));
        let (without, source) = PipelineKey::for_material(None);

        assert_eq!(with_material, without);
        assert_eq!(source.label, "standard");
    }

    #[test]
    fn test_shader_material_state_feeds_pipeline_key() {
        let mut shader = ShaderMaterial::new(GLOW);
        shader.blend = BlendMode::AlphaCombine;
        shader.back_face_culling = false;
        shader.depth_bias = -1;

        let (key, source) = PipelineKey::for_material(Some(&material(MaterialKind::Shader(shader))));

        assert_eq!(source, GLOW);
        assert_eq!(key.blend, BlendMode::AlphaCombine);
        assert!(!key.cull);
        assert_eq!(key.depth_bias, -1);
        assert!(!key.fullscreen);
    }

    #[test]
    fn test_translucent_standard_material_blends() {
        let glass = material(MaterialKind::Standard(StandardMaterial {
            alpha: 0.5,
            ..Default::default()
        }));
        let (key, _) = PipelineKey::for_material(Some(&glass));
        assert_eq!(key.blend, BlendMode::AlphaCombine);
    }

    /// Device without a surface; `None` on machines with no usable adapter
    fn test_gpu() -> Option<GpuContext> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).ok()?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(GpuContext::from_parts(device, queue))
    }

    #[test]
    fn test_texture_delta_applies_without_a_frame() {
        let Some(gpu) = test_gpu() else {
            eprintln!("no adapter, skipping");
            return;
        };
        let mut renderer = egui_wgpu::Renderer::new(
            gpu.device(),
            wgpu::TextureFormat::Bgra8UnormSrgb,
            egui_wgpu::RendererOptions::default(),
        );

        let atlas = egui::TextureId::Managed(0);
        let image = egui::ColorImage::from_rgba_unmultiplied([2, 2], &[255; 16]);
        let upload = egui::TexturesDelta {
            set: vec![(atlas, egui::epaint::ImageDelta::full(image, egui::TextureOptions::LINEAR))],
            free: Vec::new(),
        };

        upload_textures(&mut renderer, &gpu, &upload);
        assert!(renderer.texture(&atlas).is_some());

        let release = egui::TexturesDelta {
            set: Vec::new(),
            free: vec![atlas],
        };
        free_textures(&mut renderer, &release);
        assert!(renderer.texture(&atlas).is_none());
    }
}
