//! Score persistence
//!
//! Features:
//! - Personal bests per (user, game, difficulty)
//! - Leaderboard append for every completed run
//! - Guest play: nothing is written without a session
//! - Optional play-statistics reporting

use std::rc::Rc;

use crate::GameId;
use crate::leaderboard::{LeaderboardEntry, Leaderboards};
use crate::platform::clock::{Clock, SystemClock, iso8601};
use crate::platform::session::{Guest, SessionProvider};
use crate::platform::storage::{KeyValueStore, MemoryStore, read_u64};
use crate::stats::{PlayToken, PlayTracker};
use crate::tuning::Difficulty;

/// What happened to a finished run's score
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No session; nothing was written
    Guest,
    /// Score stored for `username`
    Recorded {
        username: String,
        previous_best: u64,
        new_best: bool,
    },
    /// Storage refused the write; the run still counts as finished
    Failed,
}

impl RecordOutcome {
    pub fn is_new_best(&self) -> bool {
        matches!(self, RecordOutcome::Recorded { new_best: true, .. })
    }
}

/// Personal-best key: `ada-game1-easy-best`, `ada-game2-best`
pub fn best_key(username: &str, game: GameId, difficulty: Option<Difficulty>) -> String {
    match difficulty {
        Some(d) => format!("{}-{}-{}-best", username, game.key(), d.as_str()),
        None => format!("{}-{}-best", username, game.key()),
    }
}

/// Writes finished runs to storage on behalf of a game engine
pub struct ScoreRecorder {
    store: Rc<dyn KeyValueStore>,
    sessions: Box<dyn SessionProvider>,
    clock: Rc<dyn Clock>,
    tracker: Option<Box<dyn PlayTracker>>,
}

impl ScoreRecorder {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        sessions: Box<dyn SessionProvider>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            tracker: None,
        }
    }

    /// A recorder that never persists anything
    pub fn guest() -> Self {
        Self::new(Rc::new(MemoryStore::new()), Box::new(Guest), Rc::new(SystemClock))
    }

    /// Attach the optional stats capability
    pub fn with_tracker(mut self, tracker: Box<dyn PlayTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    fn current_user(&self) -> Option<String> {
        self.sessions
            .current_session(self.clock.now_ms())
            .map(|s| s.username)
    }

    /// Stored personal best for the current user (0 for guests)
    pub fn best_score(&self, game: GameId, difficulty: Option<Difficulty>) -> u64 {
        match self.current_user() {
            Some(user) => read_u64(self.store.as_ref(), &best_key(&user, game, difficulty)),
            None => 0,
        }
    }

    /// Persist a finished run: the personal best if beaten, and a leaderboard
    /// entry regardless.
    pub fn record(&self, game: GameId, difficulty: Option<Difficulty>, score: u64) -> RecordOutcome {
        let Some(username) = self.current_user() else {
            log::info!("Guest run finished with {} points; not saved", score);
            return RecordOutcome::Guest;
        };

        let store = self.store.as_ref();
        let key = best_key(&username, game, difficulty);
        let previous_best = read_u64(store, &key);
        let new_best = score > previous_best;

        let mut failed = false;
        if new_best {
            match store.set(&key, &score.to_string()) {
                Ok(()) => log::info!("New personal best for {}: {} ({})", username, score, key),
                Err(e) => {
                    log::warn!("Personal best not saved: {}", e);
                    failed = true;
                }
            }
        }

        let mut boards = Leaderboards::load_stored(store);
        boards.append(
            game.board_id(),
            game.title(),
            LeaderboardEntry {
                username: username.clone(),
                score,
                date: iso8601(self.clock.now_ms()),
            },
        );
        if let Err(e) = boards.save(store) {
            log::warn!("Leaderboard entry not saved: {}", e);
            failed = true;
        }

        if failed {
            return RecordOutcome::Failed;
        }
        RecordOutcome::Recorded {
            username,
            previous_best,
            new_best,
        }
    }

    /// Report a run start to the stats capability, if present
    pub fn game_started(&mut self, game: GameId) -> Option<PlayToken> {
        let now = self.clock.now_ms();
        self.tracker.as_mut().map(|t| t.on_game_start(game, now))
    }

    /// Report a run end to the stats capability, if present
    pub fn game_ended(&mut self, game: GameId, score: u64, token: Option<PlayToken>) {
        let now = self.clock.now_ms();
        if let (Some(tracker), Some(token)) = (self.tracker.as_mut(), token) {
            tracker.on_game_end(game, score, token, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LEADERBOARD_KEY;
    use crate::platform::storage::StorageError;
    use crate::platform::{ManualClock, Session};

    fn recorder(store: &MemoryStore, user: Option<&str>) -> ScoreRecorder {
        let session = user.map(|u| Session::new(u, 0.0, 60));
        ScoreRecorder::new(
            Rc::new(store.clone()),
            Box::new(session),
            Rc::new(ManualClock::new(1000.0)),
        )
    }

    #[test]
    fn test_best_key_layout() {
        assert_eq!(
            best_key("ada", GameId::Reflex, Some(Difficulty::Medium)),
            "ada-game1-medium-best"
        );
        assert_eq!(best_key("ada", GameId::Scroller, None), "ada-game2-best");
    }

    #[test]
    fn test_best_only_raised_but_every_run_listed() {
        let store = MemoryStore::new();
        let rec = recorder(&store, Some("ada"));

        let first = rec.record(GameId::Reflex, Some(Difficulty::Easy), 20);
        assert!(first.is_new_best());
        let second = rec.record(GameId::Reflex, Some(Difficulty::Easy), 10);
        assert_eq!(
            second,
            RecordOutcome::Recorded {
                username: "ada".into(),
                previous_best: 20,
                new_best: false,
            }
        );

        assert_eq!(rec.best_score(GameId::Reflex, Some(Difficulty::Easy)), 20);
        assert_eq!(rec.best_score(GameId::Reflex, Some(Difficulty::Hard)), 0);

        let boards = Leaderboards::load_stored(&store);
        let board = boards.board("game_1").unwrap();
        assert_eq!(board.title, "Game 1");
        assert_eq!(board.scores.len(), 2);
        assert_eq!(board.scores[0].date, "1970-01-01T00:00:01.000Z");
    }

    #[test]
    fn test_guest_writes_nothing() {
        let store = MemoryStore::new();
        let rec = recorder(&store, None);
        assert_eq!(rec.record(GameId::Scroller, None, 5), RecordOutcome::Guest);
        assert!(store.is_empty());
        assert_eq!(rec.best_score(GameId::Scroller, None), 0);
    }

    #[test]
    fn test_corrupt_data_is_replaced() {
        let store = MemoryStore::new();
        store.set("ada-game2-best", "lots").unwrap();
        store.set(LEADERBOARD_KEY, "{{{").unwrap();

        let rec = recorder(&store, Some("ada"));
        let outcome = rec.record(GameId::Scroller, None, 3);
        assert!(outcome.is_new_best());
        assert_eq!(store.get("ada-game2-best").as_deref(), Some("3"));
        assert_eq!(Leaderboards::load_stored(&store).ranked("game_2").len(), 1);
    }

    /// Store that refuses writes to personal-best keys
    struct NoBestWrites(MemoryStore);

    impl KeyValueStore for NoBestWrites {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key.ends_with("-best") {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    reason: "quota exceeded".to_string(),
                });
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_failed_best_write_still_lists_run() {
        let store = MemoryStore::new();
        let rec = ScoreRecorder::new(
            Rc::new(NoBestWrites(store.clone())),
            Box::new(Some(Session::new("ada", 0.0, 60))),
            Rc::new(ManualClock::new(1000.0)),
        );

        assert_eq!(rec.record(GameId::Scroller, None, 7), RecordOutcome::Failed);
        assert_eq!(store.get("ada-game2-best"), None);
        let rows = Leaderboards::load_stored(&store).ranked("game_2");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 7);
    }

    #[test]
    fn test_tracker_is_optional() {
        let store = MemoryStore::new();
        let mut rec = recorder(&store, Some("ada"));
        let token = rec.game_started(GameId::Reflex);
        assert!(token.is_none());
        rec.game_ended(GameId::Reflex, 10, token);
    }
}
