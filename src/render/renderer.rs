use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::render::camera::Camera;
use crate::render::vertex::{self, FrameUniform, MaterialUniform, Vertex};
use crate::scene::{MaterialKind, MeshKey, MeshRef, Scene};
use crate::settings::DisplaySettings;
use crate::texture::{TextureHandle, TextureId, TextureImage};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// How a texture behaves outside the 0..1 UV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Clamp,
    Repeat,
}

impl TextureWrap {
    fn address_mode(self) -> wgpu::AddressMode {
        match self {
            TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

/// An uploaded image with its sampler already bound.
struct GpuTexture {
    bind_group: wgpu::BindGroup,
}

/// Vertex/index buffers for one quad, plus the lit material for surfaces.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: Option<wgpu::BindGroup>,
}

pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_format: wgpu::TextureFormat,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_view: wgpu::TextureView,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    texture_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,

    room_pipeline: wgpu::RenderPipeline,
    item_pipeline: wgpu::RenderPipeline,

    textures: HashMap<TextureId, GpuTexture>,
    next_texture_id: u64,
    meshes: HashMap<MeshKey, GpuMesh>,
}

impl Renderer {
    pub async fn new(window: Arc<winit::window::Window>) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).expect("failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no suitable GPU adapter found");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .expect("failed to create device");

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = Self::create_depth_texture(&device, config.width, config.height);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform"),
            size: std::mem::size_of::<FrameUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bgl"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bg"),
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let material_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bgl"),
            entries: &[uniform_entry(wgpu::ShaderStages::FRAGMENT)],
        });

        // Room surfaces: lit, single sided, opaque.
        let room_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("room_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/room.wgsl").into()),
        });

        let room_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("room_pipeline_layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &texture_bind_group_layout,
                &material_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let room_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("room_pipeline"),
            layout: Some(&room_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &room_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &room_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Placed items: unlit, alpha blended, visible from both sides.
        let item_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("item_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/item.wgsl").into()),
        });

        let item_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("item_pipeline_layout"),
            bind_group_layouts: &[&frame_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let item_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("item_pipeline"),
            layout: Some(&item_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &item_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &item_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            device,
            queue,
            surface,
            surface_format,
            config,
            depth_view,
            frame_buffer,
            frame_bind_group,
            texture_bind_group_layout,
            material_bind_group_layout,
            room_pipeline,
            item_pipeline,
            textures: HashMap::new(),
            next_texture_id: 0,
            meshes: HashMap::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
    }

    /// Upload decoded pixels and return the handle materials refer to.
    pub fn upload_texture(&mut self, image: &TextureImage, wrap: TextureWrap) -> TextureHandle {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&image.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&Default::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wrap.address_mode(),
            address_mode_v: wrap.address_mode(),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bg"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(id, GpuTexture { bind_group });
        log::debug!("Uploaded texture {} ({}x{}) as {id:?}", image.label, image.width, image.height);
        TextureHandle::new(id, image.width, image.height)
    }

    /// Rebuild GPU meshes the scene marked dirty and drop textures nothing
    /// references any more.
    pub fn sync_scene(&mut self, scene: &mut Scene) {
        for key in scene.take_dirty() {
            match scene.mesh(key) {
                Some(mesh) => self.upload_mesh(key, &mesh),
                None => {
                    self.meshes.remove(&key);
                }
            }
        }

        let used = scene.textures_in_use();
        let before = self.textures.len();
        self.textures.retain(|id, _| used.contains(id));
        if self.textures.len() != before {
            log::debug!("Released {} unused textures", before - self.textures.len());
        }
    }

    fn upload_mesh(&mut self, key: MeshKey, mesh: &MeshRef<'_>) {
        let (vertices, indices) = vertex::build_quad(mesh);

        if let Some(existing) = self.meshes.get(&key) {
            self.queue.write_buffer(&existing.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
            return;
        }

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let material = match mesh.material.kind {
            MaterialKind::Standard(params) => {
                let uniform = MaterialUniform::from_params(&params);
                let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("material_uniform"),
                    contents: bytemuck::bytes_of(&uniform),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("material_bg"),
                    layout: &self.material_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                }))
            }
            MaterialKind::Unlit => None,
        };

        self.meshes.insert(
            key,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: indices.len() as u32,
                material,
            },
        );
    }

    /// Upload per-frame data before the render pass begins.
    pub fn prepare_frame(&self, camera: &Camera, display: &DisplaySettings) {
        let uniform = FrameUniform::new(camera, display);
        self.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw the room, then items back to front so their transparency blends
    /// over whatever is behind them.
    pub fn render_scene<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, scene: &Scene, camera_position: Vec3) {
        pass.set_pipeline(&self.room_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for surface in scene.surfaces().iter() {
            let key = MeshKey::Surface(surface.role);
            let (Some(mesh), Some(texture)) = (self.meshes.get(&key), self.textures.get(&surface.material.texture.id))
            else {
                continue;
            };
            let Some(material) = &mesh.material else { continue };
            pass.set_bind_group(1, &texture.bind_group, &[]);
            pass.set_bind_group(2, material, &[]);
            self.draw_mesh(pass, mesh);
        }

        pass.set_pipeline(&self.item_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for id in draw_order(scene, camera_position) {
            let Some(item) = scene.item(id) else { continue };
            let (Some(mesh), Some(texture)) = (
                self.meshes.get(&MeshKey::Item(id)),
                self.textures.get(&item.material.texture.id),
            ) else {
                continue;
            };
            pass.set_bind_group(1, &texture.bind_group, &[]);
            self.draw_mesh(pass, mesh);
        }
    }

    fn draw_mesh<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, mesh: &'a GpuMesh) {
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn uniform_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Items sorted farthest first from the camera.
pub fn draw_order(scene: &Scene, camera_position: Vec3) -> Vec<crate::scene::ItemId> {
    let mut order: Vec<_> = scene
        .items()
        .map(|(id, item)| (id, item.transform.position.distance_squared(camera_position)))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    order.into_iter().map(|(id, _)| id).collect()
}

/// Background color for the main pass.
pub fn clear_color(display: &DisplaySettings) -> wgpu::Color {
    let [r, g, b] = display.bg_color;
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::{PlaneGeometry, Transform};
    use crate::scene::{Material, PlacedItem};

    fn item_at(z: f32) -> PlacedItem {
        PlacedItem {
            asset_id: "x".into(),
            geometry: PlaneGeometry::new(1.0, 1.0),
            transform: Transform { position: Vec3::new(0.0, 0.5, z), ..Transform::default() },
            material: Material::unlit(TextureHandle::new(TextureId(0), 1, 1)),
        }
    }

    #[test]
    fn items_draw_far_to_near() {
        let mut scene = Scene::new();
        let near = scene.add_item(item_at(2.0));
        let far = scene.add_item(item_at(-2.0));
        let mid = scene.add_item(item_at(0.0));
        assert_eq!(draw_order(&scene, Vec3::new(0.0, 3.0, 7.0)), vec![far, mid, near]);
    }

    #[test]
    fn clear_color_is_opaque() {
        let display = DisplaySettings { bg_color: [0.5, 0.25, 0.0], ..DisplaySettings::default() };
        let color = clear_color(&display);
        assert_eq!((color.r, color.g, color.b, color.a), (0.5, 0.25, 0.0, 1.0));
    }
}
