use glam::Vec2;

/// Size of the drawable area in physical pixels plus the display's pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self { width, height, scale_factor }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.size() / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same physical size at a new pixel density. The size itself is only
    /// trusted once the window reports it.
    pub fn with_scale_factor(self, scale_factor: f64) -> Self {
        Self { scale_factor, ..self }
    }
}
