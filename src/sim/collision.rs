//! Collision detection for the side-scroller
//!
//! The bird is a circle, each obstacle is two axis-aligned solids (above and
//! below the gap). Tests use the closest point on the rectangle to the circle
//! center; touching counts as a hit.

use glam::Vec2;

use super::state::{Bird, Obstacle};

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Point of the rectangle nearest to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.max(self.x).min(self.x + self.w),
            p.y.max(self.y).min(self.y + self.h),
        )
    }
}

/// Circle vs rectangle, boundary inclusive
#[inline]
pub fn circle_rect_collision(center: Vec2, radius: f32, rect: &Rect) -> bool {
    center.distance_squared(rect.closest_point(center)) <= radius * radius
}

/// The solid parts of an obstacle: above the gap, and below it down to the floor
pub fn obstacle_solids(obstacle: &Obstacle, view_height: f32) -> [Rect; 2] {
    let bottom_y = obstacle.gap_bottom();
    [
        Rect::new(obstacle.x, 0.0, obstacle.width, obstacle.gap_top),
        Rect::new(obstacle.x, bottom_y, obstacle.width, view_height - bottom_y),
    ]
}

/// Check if the bird overlaps either solid of an obstacle
pub fn bird_hits_obstacle(bird: &Bird, obstacle: &Obstacle, view_height: f32) -> bool {
    obstacle_solids(obstacle, view_height)
        .iter()
        .any(|rect| circle_rect_collision(bird.pos, bird.radius, rect))
}
