//! Keyboard and mouse handling for the viewer.
//!
//! | Input        | Command                                  |
//! |--------------|------------------------------------------|
//! | `R`          | rasterize                                |
//! | `T`          | raytrace                                 |
//! | `A`          | toggle animation                         |
//! | `S`          | save a screenshot                        |
//! | `1` `2` `3`  | bounce the light along x, y or z         |
//! | arrow keys   | steer the pyramid while held             |
//! | left click   | pick the object under the cursor         |

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::animation::Steer;
use crate::math::Axes;

/// Which renderer draws the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Rasterizer,
    Raytracer,
}

/// Something the viewer should do in response to input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    SwitchBackend(Backend),
    ToggleAnimation,
    Screenshot,
    JumpAxis(Axes),
    /// Start (`true`) or stop steering in a direction.
    Steer(Steer, bool),
    /// Pick at a window position in physical pixels.
    Pick(Vec2),
}

/// Map a key transition to a command.
///
/// Held keys only produce a steering command; the other commands fire once
/// per press and ignore key repeat.
pub fn command_for_key(key: KeyCode, state: ElementState, repeat: bool) -> Option<Command> {
    let pressed = state == ElementState::Pressed;
    let steer = match key {
        KeyCode::ArrowUp => Some(Steer::Up),
        KeyCode::ArrowDown => Some(Steer::Down),
        KeyCode::ArrowLeft => Some(Steer::Left),
        KeyCode::ArrowRight => Some(Steer::Right),
        _ => None,
    };
    if let Some(direction) = steer {
        return Some(Command::Steer(direction, pressed));
    }
    if !pressed || repeat {
        return None;
    }
    match key {
        KeyCode::KeyR => Some(Command::SwitchBackend(Backend::Rasterizer)),
        KeyCode::KeyT => Some(Command::SwitchBackend(Backend::Raytracer)),
        KeyCode::KeyA => Some(Command::ToggleAnimation),
        KeyCode::KeyS => Some(Command::Screenshot),
        KeyCode::Digit1 => Some(Command::JumpAxis(Axes::X)),
        KeyCode::Digit2 => Some(Command::JumpAxis(Axes::Y)),
        KeyCode::Digit3 => Some(Command::JumpAxis(Axes::Z)),
        _ => None,
    }
}

/// Tracks the cursor and held keys, and turns window events into commands.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and return the command it triggers, if any.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<Command> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return None;
                };
                match event.state {
                    ElementState::Pressed => {
                        self.keys_down.insert(key);
                    }
                    ElementState::Released => {
                        self.keys_down.remove(&key);
                    }
                }
                command_for_key(key, event.state, event.repeat)
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => Some(Command::Pick(self.mouse_position)),
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
                None
            }
            _ => None,
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}
