//! Leaderboard store and renderer
//!
//! Persisted to LocalStorage as one record keyed by board id ("game_1"), each
//! board holding an append-only list of scores. Games only append; sorting
//! happens here, right before display.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::platform::storage::{KeyValueStore, StorageError, read_json, write_json};

/// LocalStorage key of the whole leaderboard record
pub const LEADERBOARD_KEY: &str = "leaderboard_data";

/// Text shown for a board without scores
pub const EMPTY_BOARD_TEXT: &str = "No scores yet.";

/// A single completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u64,
    /// ISO-8601 timestamp of the run
    pub date: String,
}

/// One game's board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameBoard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub scores: Vec<LeaderboardEntry>,
}

impl GameBoard {
    pub fn new(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            description: description.map(str::to_string),
            scores: Vec::new(),
        }
    }
}

/// A ranked row ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    /// 1-indexed
    pub rank: usize,
    pub username: String,
    pub score: u64,
    /// Display date
    pub date: String,
}

/// All boards, keyed by board id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboards {
    boards: BTreeMap<String, GameBoard>,
}

impl Leaderboards {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards shown on the leaderboard page even before anyone has played
    pub fn with_defaults() -> Self {
        let mut boards = BTreeMap::new();
        for (id, title, description) in [
            ("game_1", "Game 1 - Click Targets", "Test your reflexes!"),
            ("game_2", "Game 2 - Jumpy Bird", "Fly through the gaps!"),
            ("game_3", "Game 3 - TBD", "Coming soon..."),
            ("game_4", "Game 4 - TBD", "Coming soon..."),
        ] {
            boards.insert(id.to_string(), GameBoard::new(title, Some(description)));
        }
        Self { boards }
    }

    /// Load exactly what is stored. Missing or corrupt data reads as empty.
    pub fn load_stored(store: &dyn KeyValueStore) -> Self {
        read_json(store, LEADERBOARD_KEY).unwrap_or_default()
    }

    /// Load for display: stored boards override the default boards
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut merged = Self::with_defaults();
        let stored = Self::load_stored(store);
        log::info!("Loaded {} leaderboard boards", stored.boards.len());
        merged.boards.extend(stored.boards);
        merged
    }

    /// Save the record
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        write_json(store, LEADERBOARD_KEY, self)?;
        log::info!("Leaderboards saved ({} boards)", self.boards.len());
        Ok(())
    }

    /// Append an entry, creating the board with `title` if it does not exist
    pub fn append(&mut self, board_id: &str, title: &str, entry: LeaderboardEntry) {
        self.boards
            .entry(board_id.to_string())
            .or_insert_with(|| GameBoard::new(title, None))
            .scores
            .push(entry);
    }

    pub fn board(&self, board_id: &str) -> Option<&GameBoard> {
        self.boards.get(board_id)
    }

    pub fn board_ids(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    /// Scores sorted highest first. Ties keep their recorded order.
    pub fn ranked(&self, board_id: &str) -> Vec<LeaderboardRow> {
        let Some(board) = self.boards.get(board_id) else {
            return Vec::new();
        };

        let mut sorted: Vec<&LeaderboardEntry> = board.scores.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, e)| LeaderboardRow {
                rank: i + 1,
                username: e.username.clone(),
                score: e.score,
                date: format_date(&e.date),
            })
            .collect()
    }

    /// Get the top score of a board (if any)
    pub fn top_score(&self, board_id: &str) -> Option<u64> {
        self.boards
            .get(board_id)
            .and_then(|b| b.scores.iter().map(|e| e.score).max())
    }
}

/// Format an ISO-8601 timestamp as `YYYY-MM-DD HH:MM`.
///
/// Strings that don't parse as a timestamp are shown unchanged.
pub fn format_date(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| iso.to_string())
}
