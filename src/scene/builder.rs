use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::scene::mesh::{PlaneGeometry, Transform};
use crate::scene::object::{Material, Surface};
use crate::scene::SurfaceRole;
use crate::texture::TextureHandle;

/// Vertical UV rescale applied to both walls.
pub const WALL_UV_SCALE: f32 = 0.35;

/// Fixed placement of one room surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceLayout {
    pub width: f32,
    pub height: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub uv_scale: Option<f32>,
}

pub fn layout(role: SurfaceRole) -> SurfaceLayout {
    match role {
        SurfaceRole::Floor => SurfaceLayout {
            width: 5.0,
            height: 5.0,
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_x(-PI / 2.0),
            uv_scale: None,
        },
        SurfaceRole::Wall1 => SurfaceLayout {
            width: 5.0,
            height: 5.0,
            position: Vec3::new(0.0, 2.5, -2.5),
            rotation: Quat::IDENTITY,
            uv_scale: Some(WALL_UV_SCALE),
        },
        // Rotated by PI / 2.1 rather than a right angle so the edge of the
        // front wall stays visible.
        SurfaceRole::Wall2 => SurfaceLayout {
            width: 2.5,
            height: 5.0,
            position: Vec3::new(-2.2, 2.5, -0.01),
            rotation: Quat::from_rotation_y(PI / 2.1),
            uv_scale: Some(WALL_UV_SCALE),
        },
    }
}

/// Build a textured surface for `role` at its fixed layout.
pub fn build_surface(role: SurfaceRole, texture: TextureHandle, uv_repeat: f32) -> Surface {
    let layout = layout(role);
    let mut geometry = PlaneGeometry::new(layout.width, layout.height);
    if let Some(scale) = layout.uv_scale {
        geometry.adjust_uvs(scale);
    }
    let mut material = Material::standard(texture);
    material.uv_repeat = uv_repeat;

    Surface {
        role,
        geometry,
        transform: Transform::from_position_rotation(layout.position, layout.rotation),
        material,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::object::MaterialKind;
    use crate::texture::TextureId;

    fn tex() -> TextureHandle {
        TextureHandle::new(TextureId(7), 64, 64)
    }

    #[test]
    fn floor_lies_flat_on_origin() {
        let floor = build_surface(SurfaceRole::Floor, tex(), 1.0);
        for corner in floor.world_corners() {
            assert!(corner.y.abs() < 1e-5);
            assert!((corner.x.abs() - 2.5).abs() < 1e-5);
            assert!((corner.z.abs() - 2.5).abs() < 1e-5);
        }
        assert!((floor.transform.normal() - Vec3::Y).length() < 1e-5);
        assert_eq!(floor.geometry.uvs[2].y, 1.0);
    }

    #[test]
    fn front_wall_stands_behind_floor() {
        let wall = build_surface(SurfaceRole::Wall1, tex(), 1.0);
        let corners = wall.world_corners();
        assert!(corners.iter().all(|c| (c.z + 2.5).abs() < 1e-5));
        assert!((corners[0].y).abs() < 1e-5);
        assert!((corners[2].y - 5.0).abs() < 1e-5);
        assert!((wall.geometry.uvs[2].y - 0.65).abs() < 1e-6);
    }

    #[test]
    fn left_wall_is_not_quite_square() {
        let wall = build_surface(SurfaceRole::Wall2, tex(), 1.0);
        let normal = wall.transform.normal();
        let angle = normal.angle_between(Vec3::Z);
        assert!((angle - PI / 2.1).abs() < 1e-5);
        assert!(normal.x > 0.0);
        assert_eq!(wall.geometry.width, 2.5);
    }

    #[test]
    fn surfaces_use_standard_material() {
        let wall = build_surface(SurfaceRole::Wall1, tex(), 2.0);
        assert_eq!(wall.material.uv_repeat, 2.0);
        let MaterialKind::Standard(params) = wall.material.kind else {
            panic!("surface should be lit");
        };
        assert_eq!(params.roughness, 0.4);
        assert_eq!(params.metalness, 0.1);
        assert_eq!(params.emissive_intensity, 0.3);
    }
}
