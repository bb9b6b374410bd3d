//! Data-driven game balance
//!
//! Immutable tables. Nothing here is editable at runtime; user preferences
//! live in `settings`.

use serde::{Deserialize, Serialize};

/// Reflex game difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Look up a difficulty by its key. Unknown keys give `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }
}

/// Reflex game balance for one difficulty
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    /// Target diameter in pixels
    pub target_size: f32,
    /// How long an unhit target stays up
    pub target_lifetime_ms: f64,
    /// Delay between spawns
    pub spawn_interval_ms: f64,
    pub points_per_hit: i64,
    /// Applied on every expired target (negative)
    pub miss_penalty: i64,
    /// Playfield background (CSS color)
    pub theme_color: &'static str,
}

pub const EASY: DifficultyProfile = DifficultyProfile {
    target_size: 100.0,
    target_lifetime_ms: 3000.0,
    spawn_interval_ms: 1500.0,
    points_per_hit: 10,
    miss_penalty: -5,
    theme_color: "#4CAF50",
};

pub const MEDIUM: DifficultyProfile = DifficultyProfile {
    target_size: 70.0,
    target_lifetime_ms: 2000.0,
    spawn_interval_ms: 1000.0,
    points_per_hit: 20,
    miss_penalty: -10,
    theme_color: "#FF9800",
};

pub const HARD: DifficultyProfile = DifficultyProfile {
    target_size: 40.0,
    target_lifetime_ms: 1000.0,
    spawn_interval_ms: 700.0,
    points_per_hit: 50,
    miss_penalty: -20,
    theme_color: "#F44336",
};

/// Side-scroller physics and obstacle layout
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollerTuning {
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Velocity set by a jump (negative is up)
    pub jump_velocity: f32,
    pub bird_radius: f32,
    /// Vertical opening of each obstacle
    pub gap_height: f32,
    pub obstacle_width: f32,
    /// Obstacle cadence, independent of frame rate
    pub spawn_interval_ms: f64,
    /// Distance the gap keeps from the top and bottom edges
    pub gap_margin: f32,
    /// Obstacles spawn this far right of the viewport
    pub spawn_offset: f32,
    /// Obstacles are dropped once this far past the left edge
    pub offscreen_tolerance: f32,
}

impl Default for ScrollerTuning {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            jump_velocity: -340.0,
            bird_radius: 12.0,
            gap_height: 150.0,
            obstacle_width: 70.0,
            spawn_interval_ms: 1300.0,
            gap_margin: 30.0,
            spawn_offset: 10.0,
            offscreen_tolerance: 10.0,
        }
    }
}

/// Side-scroller speed ramp
#[derive(Debug, Clone, PartialEq)]
pub struct RampTuning {
    pub interval_ms: f64,
    /// Multiplier applied on every ramp step
    pub growth: f32,
    pub start_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for RampTuning {
    fn default() -> Self {
        Self {
            interval_ms: 5000.0,
            growth: 1.1,
            start_speed: 210.0,
            min_speed: 180.0,
            max_speed: 820.0,
        }
    }
}
