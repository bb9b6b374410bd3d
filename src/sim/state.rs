//! Game entities shared by the engines and the renderer

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{BIRD_ANCHOR_X, MIN_VIEW_HEIGHT, MIN_VIEW_WIDTH};

/// Lifecycle of a reflex target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    /// Clickable
    Active,
    /// Clicked; waiting out the cosmetic removal delay
    Hit,
    /// Timed out
    Expired,
}

/// A clickable reflex target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    /// Top-left corner within the playfield
    pub pos: Vec2,
    /// Diameter
    pub size: f32,
    /// Engine time (ms) the target appeared
    pub spawned_at: f64,
    pub state: TargetState,
}

impl Target {
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    /// Whether a pointer at `point` lands on the (round) target
    pub fn contains(&self, point: Vec2) -> bool {
        let r = self.size / 2.0;
        point.distance_squared(self.center()) <= r * r
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }
}

/// The side-scroller's player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Center
    pub pos: Vec2,
    /// Positive is down
    pub vel_y: f32,
    pub radius: f32,
}

impl Bird {
    pub fn new(radius: f32, view: &Viewport) -> Self {
        let mut bird = Self {
            pos: Vec2::ZERO,
            vel_y: 0.0,
            radius,
        };
        bird.reset(view);
        bird
    }

    /// Back to the start position, at rest
    pub fn reset(&mut self, view: &Viewport) {
        self.pos = Vec2::new(view.bird_anchor_x(), (view.height * 0.5).floor());
        self.vel_y = 0.0;
    }
}

/// A pipe pair with a gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Left edge
    pub x: f32,
    pub width: f32,
    /// Bottom of the upper solid
    pub gap_top: f32,
    pub gap_height: f32,
    /// Set once the bird has passed it
    pub scored: bool,
}

impl Obstacle {
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Top of the lower solid
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }
}

/// Playable area of the side-scroller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Viewport for a container of the given size, never below the minimum
    pub fn fit(width: f32, height: f32) -> Self {
        Self {
            width: width.floor().max(MIN_VIEW_WIDTH),
            height: height.floor().max(MIN_VIEW_HEIGHT),
        }
    }

    /// Horizontal position the bird flies at
    pub fn bird_anchor_x(&self) -> f32 {
        (self.width * BIRD_ANCHOR_X).floor()
    }
}
