//! 2D rendering module
//!
//! Scenes are built from engine snapshots as a flat list of draw commands,
//! which a `Surface` executes. The simulation never touches the canvas.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use scene::{reflex_scene, scroller_scene};

use glam::Vec2;

/// One drawing primitive. Colors are CSS color strings.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface
    Clear { color: &'static str },
    FillRect {
        pos: Vec2,
        size: Vec2,
        color: &'static str,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: &'static str,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        color: &'static str,
        line_width: f32,
    },
}

/// Something that can execute draw commands
pub trait Surface {
    /// Logical size in CSS pixels
    fn size(&self) -> Vec2;
    fn draw(&mut self, command: &DrawCommand);
}

/// Execute a whole scene in order
pub fn render(surface: &mut dyn Surface, commands: &[DrawCommand]) {
    for command in commands {
        surface.draw(command);
    }
}
