use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Other,
}

/// Pointer and keyboard input for the 3D view, in window pixels from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Vec2, button: PointerButton },
    PointerMove { pos: Vec2 },
    PointerUp { pos: Vec2, button: PointerButton },
    /// Positive `delta_y` scrolls down, as browsers report it.
    Wheel { delta_y: f32 },
    KeyPress(Key),
}

/// Turns winit window events into `InputEvent`s, remembering the last
/// cursor position since button and wheel events do not carry one.
pub struct InputState {
    pub mouse_pos: Vec2,
    /// False from `HoveredFile` until the next cursor move; most platforms
    /// report no motion while a file drag hovers the window.
    cursor_tracked: bool,
    wheel_line_pixels: f32,
}

impl InputState {
    pub fn new(wheel_line_pixels: f32) -> Self {
        Self {
            mouse_pos: Vec2::ZERO,
            cursor_tracked: false,
            wheel_line_pixels,
        }
    }

    /// Track the cursor without producing an event (used while egui owns the pointer).
    pub fn observe(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);
                self.cursor_tracked = true;
            }
            WindowEvent::HoveredFile(_) => self.cursor_tracked = false,
            _ => {}
        }
    }

    /// Where a dropped file lands: the cursor if it moved during the file
    /// drag, otherwise `fallback`.
    pub fn drop_position(&self, fallback: Vec2) -> Vec2 {
        if self.cursor_tracked {
            self.mouse_pos
        } else {
            log::debug!("No cursor position during file drag, dropping at {fallback}");
            fallback
        }
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { .. } => {
                self.observe(event);
                Some(InputEvent::PointerMove { pos: self.mouse_pos })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_button(*button);
                let pos = self.mouse_pos;
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown { pos, button },
                    ElementState::Released => InputEvent::PointerUp { pos, button },
                })
            }
            WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Wheel {
                delta_y: wheel_delta_y(*delta, self.wheel_line_pixels),
            }),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                Some(InputEvent::KeyPress(map_key(event.physical_key)))
            }
            _ => {
                self.observe(event);
                None
            }
        }
    }
}

pub fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

pub fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::Delete) => Key::Delete,
        _ => Key::Other,
    }
}

/// winit reports scrolling up as positive; flip to the browser convention
/// and convert line steps to pixels.
pub fn wheel_delta_y(delta: MouseScrollDelta, line_pixels: f32) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * line_pixels,
        MouseScrollDelta::PixelDelta(p) => -p.y as f32,
    }
}
