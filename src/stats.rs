//! Per-user play statistics
//!
//! Stored inside each `UserRecord` (see `accounts`). Games report through the
//! optional `PlayTracker` capability; the dashboard reads a summary.

use serde::{Deserialize, Serialize};

use crate::GameId;
use crate::accounts::{UserRecord, Users};
use crate::platform::clock::iso8601;
use crate::platform::session::SessionProvider;
use crate::platform::storage::KeyValueStore;

/// How often the open session's duration is refreshed
pub const SESSION_UPDATE_INTERVAL_MS: f64 = 30_000.0;
/// Login history entries kept per user
pub const LOGIN_HISTORY_LEN: usize = 10;
/// Logins shown on the dashboard
pub const RECENT_ACTIVITY_LEN: usize = 5;

/// Aggregates for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStats {
    pub games_played: u32,
    /// Seconds
    pub total_time: u64,
    pub best_score: u64,
    pub total_score: u64,
    pub average_score: u64,
}

impl GameStats {
    fn record(&mut self, score: u64, duration_secs: u64) {
        self.games_played += 1;
        self.total_time += duration_secs;
        self.total_score += score;
        self.average_score = self.total_score / u64::from(self.games_played);
        self.best_score = self.best_score.max(score);
    }
}

/// Aggregates across games
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    /// Seconds
    pub total_play_time: u64,
    pub total_games_played: u32,
    /// Epoch millis of the open login session
    pub session_start_time: Option<f64>,
    pub game1: GameStats,
    pub game2: GameStats,
}

impl UserStats {
    pub fn game(&self, game: GameId) -> &GameStats {
        match game {
            GameId::Reflex => &self.game1,
            GameId::Scroller => &self.game2,
        }
    }

    fn game_mut(&mut self, game: GameId) -> &mut GameStats {
        match game {
            GameId::Reflex => &mut self.game1,
            GameId::Scroller => &mut self.game2,
        }
    }
}

/// One login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRecord {
    /// ISO-8601
    pub date: String,
    /// Seconds
    #[serde(default)]
    pub duration: u64,
}

/// Returned by `on_game_start`, handed back to `on_game_end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayToken {
    pub started_at: f64,
}

/// Optional capability the engines report runs to
pub trait PlayTracker {
    fn on_game_start(&mut self, game: GameId, now_ms: f64) -> PlayToken;
    fn on_game_end(&mut self, game: GameId, score: u64, token: PlayToken, now_ms: f64);
}

/// Note a login on the record: bumps counters and opens a history entry
pub fn track_session_start(record: &mut UserRecord, now_ms: f64) {
    let now = iso8601(now_ms);
    record.last_login = Some(now.clone());
    record.total_logins += 1;
    record.login_history.insert(
        0,
        LoginRecord {
            date: now,
            duration: 0,
        },
    );
    record.login_history.truncate(LOGIN_HISTORY_LEN);
    record.stats.session_start_time = Some(now_ms);
}

/// Refresh the open history entry's duration
pub fn update_session_time(record: &mut UserRecord, now_ms: f64) {
    if let Some(start) = record.stats.session_start_time {
        let duration = elapsed_secs(start, now_ms);
        if let Some(latest) = record.login_history.first_mut() {
            latest.duration = duration;
        }
    }
}

/// Close the open history entry
pub fn track_session_end(record: &mut UserRecord, now_ms: f64) {
    update_session_time(record, now_ms);
    record.stats.session_start_time = None;
}

fn elapsed_secs(start_ms: f64, now_ms: f64) -> u64 {
    ((now_ms - start_ms) / 1000.0).max(0.0).floor() as u64
}

/// Tracks the logged-in user's stats in the `users` record
pub struct UserStatsTracker<S, P> {
    store: S,
    sessions: P,
}

impl<S: KeyValueStore, P: SessionProvider> UserStatsTracker<S, P> {
    pub fn new(store: S, sessions: P) -> Self {
        Self { store, sessions }
    }

    /// Apply `f` to the current user's record and save. Guests are ignored.
    fn update_current(&self, now_ms: f64, f: impl FnOnce(&mut UserRecord)) {
        let Some(session) = self.sessions.current_session(now_ms) else {
            return;
        };
        let mut users = Users::load(&self.store);
        let Some(record) = users.get_mut(&session.username) else {
            return;
        };
        f(record);
        if let Err(e) = users.save(&self.store) {
            log::warn!("Stats for {} not saved: {}", session.username, e);
        }
    }

    /// Periodic heartbeat (every `SESSION_UPDATE_INTERVAL_MS`)
    pub fn update_session_time(&self, now_ms: f64) {
        self.update_current(now_ms, |r| update_session_time(r, now_ms));
    }

    /// Page unload
    pub fn session_ended(&self, now_ms: f64) {
        self.update_current(now_ms, |r| track_session_end(r, now_ms));
    }
}

impl<S: KeyValueStore, P: SessionProvider> PlayTracker for UserStatsTracker<S, P> {
    fn on_game_start(&mut self, _game: GameId, now_ms: f64) -> PlayToken {
        PlayToken { started_at: now_ms }
    }

    fn on_game_end(&mut self, game: GameId, score: u64, token: PlayToken, now_ms: f64) {
        let duration = elapsed_secs(token.started_at, now_ms);
        self.update_current(now_ms, |r| {
            r.stats.game_mut(game).record(score, duration);
            r.stats.total_games_played += 1;
            r.stats.total_play_time += duration;
        });
    }
}

/// Game with the most play time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favorite {
    None,
    Game(GameId),
    Both,
}

pub fn favorite_game(stats: &UserStats) -> Favorite {
    let (t1, t2) = (stats.game1.total_time, stats.game2.total_time);
    match t1.cmp(&t2) {
        _ if t1 == 0 && t2 == 0 => Favorite::None,
        std::cmp::Ordering::Greater => Favorite::Game(GameId::Reflex),
        std::cmp::Ordering::Less => Favorite::Game(GameId::Scroller),
        std::cmp::Ordering::Equal => Favorite::Both,
    }
}

/// `45s`, `2m 5s`, `1h 1m`
pub fn format_play_time(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// What the dashboard shows for a user
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_games: u32,
    pub total_play_time: String,
    pub game1_best: u64,
    pub game2_best: u64,
    pub favorite: Favorite,
    /// Display dates of the latest logins, newest first
    pub recent_logins: Vec<String>,
}

impl DashboardSummary {
    pub fn for_user(record: &UserRecord) -> Self {
        let stats = &record.stats;
        Self {
            total_games: stats.total_games_played,
            total_play_time: format_play_time(stats.total_play_time),
            game1_best: stats.game1.best_score,
            game2_best: stats.game2.best_score,
            favorite: favorite_game(stats),
            recent_logins: record
                .login_history
                .iter()
                .take(RECENT_ACTIVITY_LEN)
                .map(|l| crate::leaderboard::format_date(&l.date))
                .collect(),
        }
    }
}
