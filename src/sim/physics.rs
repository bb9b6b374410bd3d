//! Bird integration and boundary handling

use super::state::{Bird, Viewport};
use crate::clamp_lenient;

/// Which edge of the viewport the bird touched this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    None,
    /// Clamped, velocity zeroed; not fatal
    Ceiling,
    /// Clamped; ends the run
    Floor,
}

/// Semi-implicit Euler step: velocity first, then position
pub fn integrate(bird: &mut Bird, gravity: f32, dt: f32) {
    bird.vel_y += gravity * dt;
    bird.pos.y += bird.vel_y * dt;
}

/// Jumps replace the current velocity rather than adding to it
pub fn jump(bird: &mut Bird, impulse: f32) {
    bird.vel_y = impulse;
}

/// Keep the bird within `[radius, height - radius]`
pub fn resolve_bounds(bird: &mut Bird, view_height: f32) -> Boundary {
    let mut hit = Boundary::None;

    if bird.pos.y - bird.radius <= 0.0 {
        bird.pos.y = bird.radius;
        bird.vel_y = 0.0;
        hit = Boundary::Ceiling;
    }

    if bird.pos.y + bird.radius >= view_height {
        bird.pos.y = view_height - bird.radius;
        hit = Boundary::Floor;
    }

    hit
}

/// One physics step
pub fn step(bird: &mut Bird, gravity: f32, dt: f32, view_height: f32) -> Boundary {
    integrate(bird, gravity, dt);
    resolve_bounds(bird, view_height)
}

/// Pull the bird fully inside a (possibly resized) viewport
pub fn clamp_inside(bird: &mut Bird, view: &Viewport) {
    bird.pos.x = clamp_lenient(bird.pos.x, bird.radius, view.width - bird.radius);
    bird.pos.y = clamp_lenient(bird.pos.y, bird.radius, view.height - bird.radius);
}
