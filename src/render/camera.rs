use glam::{Mat4, Vec3};

use crate::settings::CameraSettings;

/// Fixed perspective camera looking into the room.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Width over height; only changed through `set_aspect`.
    pub aspect: f32,
}

impl Camera {
    pub fn new(settings: &CameraSettings, width: f32, height: f32) -> Self {
        let mut camera = Self {
            position: Vec3::from(settings.position),
            target: Vec3::from(settings.target),
            up: Vec3::Y,
            fov_y: settings.fov_degrees.to_radians(),
            near: settings.near_plane,
            far: settings.far_plane,
            aspect: 16.0 / 9.0,
        };
        camera.set_aspect(width, height);
        camera
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
