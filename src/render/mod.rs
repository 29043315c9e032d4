mod renderer;
mod camera;
mod vertex;
mod viewport;

pub use renderer::{Renderer, TextureWrap, clear_color};
pub use camera::Camera;
pub use viewport::Viewport;
