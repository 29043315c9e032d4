use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

/// A flat rectangle in its local XY plane, facing +Z, centered on the origin.
///
/// Corners are stored as [bottom-left, bottom-right, top-right, top-left], so
/// the two triangles are 0-1-2 and 0-2-3. UVs follow the usual image
/// convention of v = 1 at the top edge.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub positions: [Vec3; 4],
    pub uvs: [Vec2; 4],
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self {
            width,
            height,
            positions: [
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            uvs: [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
        }
    }

    /// Remap every v to `(1 - v) * scale + (1 - scale)`.
    ///
    /// Fixed correction for wall textures whose aspect does not match the
    /// wall height; it also flips the texture vertically.
    pub fn adjust_uvs(&mut self, scale: f32) {
        for uv in &mut self.uvs {
            uv.y = (1.0 - uv.y) * scale + (1.0 - scale);
        }
    }

    /// Corner positions after applying `transform`.
    pub fn world_corners(&self, transform: &Transform) -> [Vec3; 4] {
        let m = transform.matrix();
        self.positions.map(|p| m.transform_point3(p))
    }

    /// The two triangles forming this quad (indices 0,1,2 and 0,2,3).
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base, base + 2, base + 3]
    }
}

/// Position, orientation and uniform scale of a planar entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation, scale: 1.0 }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }

    /// World-space facing direction (the local +Z axis).
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Rotation that points the local +Z axis from `from` toward `target`,
/// keeping local +Y as close to world up as possible.
pub fn face_towards(from: Vec3, target: Vec3) -> Quat {
    let z = (target - from).normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut x = Vec3::Y.cross(z);
    if x.length_squared() < 1e-10 {
        // Looking straight up or down: any horizontal right axis will do.
        x = Vec3::X;
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}
