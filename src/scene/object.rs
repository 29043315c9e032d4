use glam::Vec3;

use crate::scene::mesh::{PlaneGeometry, Transform};
use crate::scene::SurfaceRole;
use crate::texture::TextureHandle;

/// Lit material parameters for the room surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StandardParams {
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
}

impl Default for StandardParams {
    fn default() -> Self {
        Self {
            roughness: 0.4,
            metalness: 0.1,
            // 0x202020
            emissive: [32.0 / 255.0; 3],
            emissive_intensity: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialKind {
    /// Lit, single sided.
    Standard(StandardParams),
    /// Unlit, alpha blended and visible from both sides.
    Unlit,
}

/// Texture binding plus shading model. The texture can be swapped at any
/// time without touching the owning entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub texture: TextureHandle,
    pub kind: MaterialKind,
    /// How many times the texture tiles across the geometry's UV range.
    pub uv_repeat: f32,
}

impl Material {
    pub fn standard(texture: TextureHandle) -> Self {
        Self {
            texture,
            kind: MaterialKind::Standard(StandardParams::default()),
            uv_repeat: 1.0,
        }
    }

    pub fn unlit(texture: TextureHandle) -> Self {
        Self {
            texture,
            kind: MaterialKind::Unlit,
            uv_repeat: 1.0,
        }
    }
}

/// One of the three fixed room boundaries.
#[derive(Clone, Debug)]
pub struct Surface {
    pub role: SurfaceRole,
    pub geometry: PlaneGeometry,
    pub transform: Transform,
    pub material: Material,
}

impl Surface {
    pub fn world_corners(&self) -> [Vec3; 4] {
        self.geometry.world_corners(&self.transform)
    }
}

/// A decorative picture dropped onto the floor.
#[derive(Clone, Debug)]
pub struct PlacedItem {
    /// Asset id the item was created from.
    pub asset_id: String,
    pub geometry: PlaneGeometry,
    pub transform: Transform,
    pub material: Material,
}

impl PlacedItem {
    pub fn world_corners(&self) -> [Vec3; 4] {
        self.geometry.world_corners(&self.transform)
    }

    /// Vertical position that rests the item's lower edge on the floor at
    /// the current scale.
    pub fn floor_anchored_y(&self) -> f32 {
        self.geometry.height * self.transform.scale / 2.0
    }

    /// Width over height of the unscaled geometry.
    pub fn aspect(&self) -> f32 {
        self.geometry.width / self.geometry.height
    }
}
