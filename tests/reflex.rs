//! Reflex game driven end to end with explicit timestamps

use std::rc::Rc;

use arcade_portal::accounts::{Accounts, Users};
use arcade_portal::leaderboard::Leaderboards;
use arcade_portal::platform::{KeyValueStore, ManualClock, MemoryStore, Session, StoredSession};
use arcade_portal::sim::ReflexEngine;
use arcade_portal::stats::UserStatsTracker;
use arcade_portal::tuning::Difficulty;
use arcade_portal::{GameId, RecordOutcome, ScoreRecorder, Settings};
use proptest::prelude::*;

fn recorder_for(store: &MemoryStore, user: Option<&str>, clock: Rc<ManualClock>) -> ScoreRecorder {
    ScoreRecorder::new(
        Rc::new(store.clone()),
        Box::new(user.map(|u| Session::new(u, 0.0, 60))),
        clock,
    )
}

/// Id of the newest target still on the field
fn newest_target(game: &ReflexEngine) -> u32 {
    game.snapshot()
        .targets
        .last()
        .map(|t| t.id)
        .expect("a target on the field")
}

#[test]
fn test_three_hits_two_misses() {
    let store = MemoryStore::new();
    let clock = Rc::new(ManualClock::new(5_000.0));
    let mut game = ReflexEngine::new(recorder_for(&store, Some("ada"), clock), 11);

    assert!(game.start("easy", 0.0));
    // Hit the first three targets as they appear (spawns at 0, 1500, 3000)
    assert!(game.hit_target(newest_target(&game), 10.0));
    game.advance(1500.0);
    assert!(game.hit_target(newest_target(&game), 1510.0));
    game.advance(3000.0);
    assert!(game.hit_target(newest_target(&game), 3010.0));
    assert_eq!(game.snapshot().score, 30);

    // Targets from 4500 and 6000 time out at 7500 and 9000
    game.advance(4500.0);
    game.advance(6000.0);
    game.advance(7500.0);
    assert_eq!(game.snapshot().score, 25);
    game.advance(9000.0);

    let summary = game.stop().expect("run was active");
    assert_eq!(summary.score, 20);
    assert_eq!(summary.hits, 3);
    assert_eq!(summary.misses, 2);
    assert!(summary.outcome.is_new_best());

    assert_eq!(store.get("ada-game1-easy-best").as_deref(), Some("20"));
    assert_eq!(game.best_score(Difficulty::Easy), 20);
    let rows = Leaderboards::load_stored(&store).ranked(GameId::Reflex.board_id());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "ada");
    assert_eq!(rows[0].score, 20);
}

#[test]
fn test_expiry_after_stop_is_not_a_miss() {
    let store = MemoryStore::new();
    let clock = Rc::new(ManualClock::new(0.0));
    let mut game = ReflexEngine::new(recorder_for(&store, Some("ada"), clock), 3);

    game.start("medium", 0.0);
    let summary = game.stop().expect("run was active");
    assert_eq!(summary.misses, 0);

    // The first target's expiry would have fired at 2000
    game.advance(10_000.0);
    let snap = game.snapshot();
    assert_eq!(snap.misses, 0);
    assert!(snap.targets.is_empty());
    assert!(!snap.active);
}

#[test]
fn test_guest_round_persists_nothing() {
    let store = MemoryStore::new();
    let clock = Rc::new(ManualClock::new(0.0));
    let mut game = ReflexEngine::new(recorder_for(&store, None, clock), 3).with_round_secs(2);

    game.start("hard", 0.0);
    game.hit_target(newest_target(&game), 50.0);
    let summary = game.advance(2000.0).expect("round ran out");

    assert_eq!(summary.outcome, RecordOutcome::Guest);
    assert_eq!(summary.hits, 1);
    assert!(store.is_empty());
}

#[test]
fn test_lower_score_keeps_best_but_is_listed() {
    let store = MemoryStore::new();
    let clock = Rc::new(ManualClock::new(0.0));
    let mut game = ReflexEngine::new(recorder_for(&store, Some("ada"), clock), 9);

    game.start("easy", 0.0);
    game.hit_target(newest_target(&game), 10.0);
    game.hit_target(1, 20.0);
    game.stop();

    game.start("easy", 100.0);
    let summary = game.stop().expect("run was active");
    assert_eq!(summary.score, 0);
    assert_eq!(
        summary.outcome,
        RecordOutcome::Recorded {
            username: "ada".into(),
            previous_best: 10,
            new_best: false,
        }
    );
    assert_eq!(store.get("ada-game1-easy-best").as_deref(), Some("10"));
    assert_eq!(Leaderboards::load_stored(&store).ranked("game_1").len(), 2);
}

#[test]
fn test_stats_follow_registered_player() {
    let store = MemoryStore::new();
    let accounts = Accounts::new(store.clone(), &Settings::default());
    accounts
        .register("ada", "ada@example.com", "hunter2", "hunter2", 0.0)
        .expect("registration succeeds");

    let clock = Rc::new(ManualClock::new(1_000.0));
    let recorder = ScoreRecorder::new(
        Rc::new(store.clone()),
        Box::new(StoredSession::new(store.clone())),
        clock.clone(),
    )
    .with_tracker(Box::new(UserStatsTracker::new(
        store.clone(),
        StoredSession::new(store.clone()),
    )));
    let mut game = ReflexEngine::new(recorder, 5).with_round_secs(30);

    game.start("medium", 0.0);
    game.hit_target(newest_target(&game), 10.0);
    clock.advance(12_000.0);
    game.stop();

    let users = Users::load(&store);
    let stats = &users.get("ada").expect("registered").stats;
    assert_eq!(stats.total_games_played, 1);
    assert_eq!(stats.total_play_time, 12);
    let reflex = stats.game(GameId::Reflex);
    assert_eq!(reflex.games_played, 1);
    assert_eq!(reflex.best_score, 20);
    assert_eq!(reflex.average_score, 20);
}

proptest! {
    /// Hits add points, each miss applies the penalty with the score floored
    /// at zero in sequence.
    #[test]
    fn prop_score_follows_sequential_floor(
        seed in any::<u64>(),
        difficulty in prop::sample::select(Difficulty::ALL.to_vec()),
        steps in prop::collection::vec((50.0f64..900.0, any::<bool>()), 1..60),
    ) {
        let profile = difficulty.profile();
        let mut game = ReflexEngine::new(ScoreRecorder::guest(), seed).with_round_secs(3600);
        game.start(difficulty.as_str(), 0.0);

        let mut expected: u64 = 0;
        let mut misses = 0;
        let mut now = 0.0;
        for (gap, hit) in steps {
            now += gap;
            game.advance(now);
            let snap = game.snapshot();
            for _ in misses..snap.misses {
                expected = expected.saturating_add_signed(profile.miss_penalty);
            }
            misses = snap.misses;
            prop_assert_eq!(snap.score, expected);

            if hit {
                let active = snap.targets.iter().find(|t| t.is_active()).map(|t| t.id);
                if let Some(id) = active {
                    prop_assert!(game.hit_target(id, now));
                    expected += profile.points_per_hit as u64;
                    prop_assert_eq!(game.snapshot().score, expected);
                }
            }
        }
    }
}
