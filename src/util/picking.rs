use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::scene::{ItemId, Scene, Surface};

/// A ray in 3D space with origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Result of a ray hitting a placed item.
#[derive(Debug, Clone, Copy)]
pub struct ItemHit {
    pub item: ItemId,
    pub distance: f32,
    pub position: Vec3,
}

/// Convert pixel coordinates (from the top-left) to normalized device
/// coordinates in -1..1, with Y pointing up.
pub fn screen_to_ndc(screen_pos: Vec2, screen_size: Vec2) -> Vec2 {
    Vec2::new(
        (2.0 * screen_pos.x / screen_size.x) - 1.0,
        1.0 - (2.0 * screen_pos.y / screen_size.y),
    )
}

impl Ray {
    /// Create a ray from screen coordinates (pixels) through the camera.
    /// `screen_pos` is in pixels from top-left, `screen_size` is viewport width/height.
    pub fn from_screen(screen_pos: Vec2, screen_size: Vec2, view_proj: Mat4) -> Self {
        Self::from_ndc(screen_to_ndc(screen_pos, screen_size), view_proj)
    }

    pub fn from_ndc(ndc: Vec2, view_proj: Mat4) -> Self {
        let inv_vp = view_proj.inverse();

        // wgpu clip depth runs 0 (near) to 1 (far)
        let near_point = inv_vp.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far_point = inv_vp.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));

        Self {
            origin: near_point,
            direction: (far_point - near_point).normalize(),
        }
    }

    /// Intersect ray with a triangle (Möller–Trumbore algorithm).
    /// Returns distance along ray if hit, None if miss. Both sides count.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let a = edge1.dot(h);

        if a.abs() < 1e-7 {
            return None; // Parallel to triangle
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t > 1e-7 { Some(t) } else { None }
    }

    /// Intersect ray with a quad (two triangles: 0-1-2 and 0-2-3).
    pub fn intersect_quad(&self, positions: &[Vec3; 4]) -> Option<f32> {
        let t1 = self.intersect_triangle(positions[0], positions[1], positions[2]);
        let t2 = self.intersect_triangle(positions[0], positions[2], positions[3]);

        match (t1, t2) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Intersect ray with an infinite plane defined by a point and normal.
    /// Returns distance along ray if hit, None if parallel or behind.
    pub fn intersect_plane(&self, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
        let denom = plane_normal.dot(self.direction);
        if denom.abs() < 1e-7 {
            return None;
        }
        let t = (plane_point - self.origin).dot(plane_normal) / denom;
        if t > 0.0 { Some(t) } else { None }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Project a 3D point to 2D screen coordinates.
/// Returns None if the point is behind the camera.
#[cfg(test)]
pub fn project_to_screen(pos: Vec3, view_proj: Mat4, screen_size: Vec2) -> Option<Vec2> {
    let clip = view_proj * pos.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * screen_size.x,
        (1.0 - ndc.y) * 0.5 * screen_size.y,
    ))
}

/// Closest draggable item under the ray.
pub fn pick_item(ray: &Ray, scene: &Scene) -> Option<ItemHit> {
    let mut closest: Option<ItemHit> = None;

    for &id in scene.draggable_ids() {
        let Some(item) = scene.item(id) else { continue };
        if let Some(t) = ray.intersect_quad(&item.world_corners()) {
            let dominated = closest.as_ref().is_some_and(|c| c.distance <= t);
            if !dominated {
                closest = Some(ItemHit {
                    item: id,
                    distance: t,
                    position: ray.point_at(t),
                });
            }
        }
    }

    closest
}

/// Where the ray meets a finite surface, if it does.
pub fn hit_surface(ray: &Ray, surface: &Surface) -> Option<Vec3> {
    ray.intersect_quad(&surface.world_corners()).map(|t| ray.point_at(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::{PlaneGeometry, Transform};
    use crate::scene::{Material, PlacedItem};
    use crate::texture::{TextureHandle, TextureId};

    fn view_proj() -> Mat4 {
        let proj = Mat4::perspective_rh(75f32.to_radians(), 4.0 / 3.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 3.0, 7.0), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    fn item_at(position: Vec3) -> PlacedItem {
        PlacedItem {
            asset_id: "x".into(),
            geometry: PlaneGeometry::new(1.0, 1.0),
            transform: Transform { position, ..Transform::default() },
            material: Material::unlit(TextureHandle::new(TextureId(0), 1, 1)),
        }
    }

    #[test]
    fn ndc_flips_y() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(screen_to_ndc(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(Vec2::new(400.0, 300.0), size), Vec2::ZERO);
        assert_eq!(screen_to_ndc(size, size), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn center_ray_hits_look_target() {
        let ray = Ray::from_screen(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0), view_proj());
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Y).unwrap();
        assert!(ray.point_at(t).length() < 1e-3);
    }

    #[test]
    fn project_and_unproject_agree() {
        let size = Vec2::new(800.0, 600.0);
        let point = Vec3::new(1.5, 0.0, -1.0);
        let screen = project_to_screen(point, view_proj(), size).unwrap();
        let ray = Ray::from_screen(screen, size, view_proj());
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Y).unwrap();
        assert!((ray.point_at(t) - point).length() < 1e-3);
    }

    #[test]
    fn plane_behind_ray_is_missed() {
        let ray = Ray { origin: Vec3::new(0.0, 1.0, 0.0), direction: Vec3::Y };
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn pick_prefers_nearest_item() {
        let mut scene = Scene::new();
        let far = scene.add_item(item_at(Vec3::new(0.0, 0.0, -2.0)));
        let near = scene.add_item(item_at(Vec3::new(0.0, 0.0, 1.0)));
        let ray = Ray { origin: Vec3::new(0.0, 0.0, 5.0), direction: -Vec3::Z };
        let hit = pick_item(&ray, &scene).unwrap();
        assert_eq!(hit.item, near);
        assert!((hit.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);

        scene.remove_item(near);
        assert_eq!(pick_item(&ray, &scene).unwrap().item, far);
    }

    #[test]
    fn pick_sees_back_faces() {
        let mut scene = Scene::new();
        let id = scene.add_item(item_at(Vec3::ZERO));
        let ray = Ray { origin: Vec3::new(0.2, 0.1, -3.0), direction: Vec3::Z };
        assert_eq!(pick_item(&ray, &scene).unwrap().item, id);
    }
}
