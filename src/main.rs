mod app;
mod error;
mod input;
mod interaction;
mod placement;
mod render;
mod scene;
mod settings;
mod texture;
mod ui;
mod util;

use app::App;

fn main() {
    env_logger::init();
    log::info!("Starting Room Visualizer");

    let event_loop = winit::event_loop::EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("event loop error");
}
