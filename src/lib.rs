//! Arcade Portal - browser mini-games with local leaderboards
//!
//! Core modules:
//! - `sim`: Headless game engines (reflex targets, side-scroller)
//! - `platform`: Timers, clock, key-value storage and sessions
//! - `persistence`: Personal bests and leaderboard recording
//! - `leaderboard`: Leaderboard store and sorted rendering rows
//! - `accounts`: Registration and login over local storage
//! - `stats`: Per-user play statistics
//! - `renderer`: Draw primitives built from engine snapshots
//! - `tuning`: Data-driven game balance

pub mod accounts;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use leaderboard::{LeaderboardEntry, Leaderboards};
pub use persistence::{RecordOutcome, ScoreRecorder};
pub use settings::Settings;

use serde::{Deserialize, Serialize};

/// Shared configuration constants
pub mod consts {
    /// Largest physics step per animation frame (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Reflex round length in seconds
    pub const REFLEX_ROUND_SECS: u32 = 30;
    /// Countdown cadence for the reflex round
    pub const COUNTDOWN_INTERVAL_MS: f64 = 1000.0;
    /// Cosmetic delay between a hit and removal of the target
    pub const HIT_REMOVAL_DELAY_MS: f64 = 200.0;

    /// Smallest playable scroller viewport
    pub const MIN_VIEW_WIDTH: f32 = 320.0;
    pub const MIN_VIEW_HEIGHT: f32 = 280.0;
    /// Bird is anchored at this fraction of the viewport width
    pub const BIRD_ANCHOR_X: f32 = 0.28;

    /// How long the level banner stays on screen
    pub const LEVEL_BANNER_MS: f64 = 1200.0;
}

/// The mini-games hosted by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    /// Target-clicking reflex game
    Reflex,
    /// Side-scrolling obstacle avoidance
    Scroller,
}

impl GameId {
    /// Short id used in personal-best keys and user stats ("game1")
    pub fn key(&self) -> &'static str {
        match self {
            GameId::Reflex => "game1",
            GameId::Scroller => "game2",
        }
    }

    /// Id of the game's board in the leaderboard record ("game_1")
    pub fn board_id(&self) -> &'static str {
        match self {
            GameId::Reflex => "game_1",
            GameId::Scroller => "game_2",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::Reflex => "Game 1",
            GameId::Scroller => "Game 2",
        }
    }
}

/// Clamp that tolerates an inverted range by collapsing onto `min`
#[inline]
pub fn clamp_lenient(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}
