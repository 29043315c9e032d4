use bytemuck::{Pod, Zeroable};

use crate::render::camera::Camera;
use crate::scene::mesh::PlaneGeometry;
use crate::scene::{MeshRef, StandardParams};
use crate::settings::DisplaySettings;

/// Per-vertex data for surfaces and items, baked in world space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,  // position
            1 => Float32x3,  // normal
            2 => Float32x2,  // uv
        ],
    };
}

/// Vertices and indices for one quad.
///
/// Geometry UVs have v = 1 at the image top; wgpu samples row 0 at v = 0,
/// so v is flipped here after the material's repeat is applied.
pub fn build_quad(mesh: &MeshRef<'_>) -> ([Vertex; 4], [u32; 6]) {
    let corners = mesh.geometry.world_corners(mesh.transform);
    let normal = mesh.transform.normal().to_array();
    let repeat = mesh.material.uv_repeat;

    let vertices = std::array::from_fn(|i| {
        let uv = mesh.geometry.uvs[i] * repeat;
        Vertex {
            position: corners[i].to_array(),
            normal,
            uv: [uv.x, 1.0 - uv.y],
        }
    });
    (vertices, PlaneGeometry::indices(0))
}

/// Per-frame shading inputs, laid out for `room.wgsl` / `item.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// Unit vector toward the directional light, w unused.
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    /// rgb premultiplied by intensity.
    pub ambient: [f32; 4],
}

impl FrameUniform {
    pub fn new(camera: &Camera, display: &DisplaySettings) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            light_dir: glam::Vec3::from(display.light_position).normalize_or_zero().extend(0.0).to_array(),
            light_color: scaled(display.light_color, display.light_intensity),
            ambient: scaled(display.ambient_color, display.ambient_intensity),
        }
    }
}

fn scaled(rgb: [f32; 3], intensity: f32) -> [f32; 4] {
    [rgb[0] * intensity, rgb[1] * intensity, rgb[2] * intensity, 1.0]
}

/// Lit material parameters for one surface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    /// x roughness, y metalness.
    pub params: [f32; 4],
    /// rgb premultiplied by emissive intensity.
    pub emissive: [f32; 4],
}

impl MaterialUniform {
    pub fn from_params(params: &StandardParams) -> Self {
        Self {
            params: [params.roughness, params.metalness, 0.0, 0.0],
            emissive: scaled(params.emissive, params.emissive_intensity),
        }
    }
}
