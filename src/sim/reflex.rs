//! Reflex target game
//!
//! Features:
//! - Timed rounds with a one-second countdown
//! - Targets spawn on a fixed cadence and expire on their own timers
//! - Hits score, expiries cost points (score never drops below zero)
//! - Runs are persisted through a `ScoreRecorder` when they end

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Target, TargetState};
use crate::GameId;
use crate::consts::{COUNTDOWN_INTERVAL_MS, HIT_REMOVAL_DELAY_MS, REFLEX_ROUND_SECS};
use crate::persistence::{RecordOutcome, ScoreRecorder};
use crate::platform::scheduler::{Fired, TimerId, TimerQueue};
use crate::stats::PlayToken;
use crate::tuning::Difficulty;

/// Playfield size used until the host reports the real one
const DEFAULT_PLAYFIELD: Vec2 = Vec2::new(600.0, 400.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReflexEvent {
    Countdown,
    Spawn,
    Expire(u32),
    /// Cosmetic removal of a hit target
    Remove(u32),
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RunState {
    score: u64,
    hits: u32,
    misses: u32,
    time_remaining: u32,
    active: bool,
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflexSummary {
    pub difficulty: Difficulty,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    pub outcome: RecordOutcome,
}

/// Read-only view for rendering and the HUD
#[derive(Debug, Clone)]
pub struct ReflexSnapshot<'a> {
    pub active: bool,
    pub difficulty: Difficulty,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    /// Whole seconds left in the round
    pub time_remaining: u32,
    pub theme_color: &'static str,
    pub playfield: Vec2,
    pub targets: &'a [Target],
}

pub struct ReflexEngine {
    run: RunState,
    difficulty: Difficulty,
    round_secs: u32,
    playfield: Vec2,
    targets: Vec<Target>,
    timers: TimerQueue<ReflexEvent>,
    countdown: Option<TimerId>,
    spawner: Option<TimerId>,
    rng: Pcg32,
    /// Never reset, so stale timers from an earlier run cannot match a new target
    next_id: u32,
    recorder: ScoreRecorder,
    play_token: Option<PlayToken>,
    last_summary: Option<ReflexSummary>,
}

impl ReflexEngine {
    pub fn new(recorder: ScoreRecorder, seed: u64) -> Self {
        Self {
            run: RunState {
                time_remaining: REFLEX_ROUND_SECS,
                ..RunState::default()
            },
            difficulty: Difficulty::default(),
            round_secs: REFLEX_ROUND_SECS,
            playfield: DEFAULT_PLAYFIELD,
            targets: Vec::new(),
            timers: TimerQueue::new(),
            countdown: None,
            spawner: None,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            recorder,
            play_token: None,
            last_summary: None,
        }
    }

    /// Override the round length (seconds, at least 1)
    pub fn with_round_secs(mut self, secs: u32) -> Self {
        self.round_secs = secs.max(1);
        self.run.time_remaining = self.round_secs;
        self
    }

    pub fn is_running(&self) -> bool {
        self.run.active
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Begin a run. Unknown difficulty keys and starts while running are ignored.
    pub fn start(&mut self, difficulty_key: &str, now: f64) -> bool {
        let Some(difficulty) = Difficulty::from_key(difficulty_key) else {
            log::warn!("Ignoring start with unknown difficulty {:?}", difficulty_key);
            return false;
        };
        if self.run.active {
            return false;
        }

        self.difficulty = difficulty;
        self.run = RunState {
            time_remaining: self.round_secs,
            active: true,
            ..RunState::default()
        };
        self.targets.clear();
        self.timers.clear();
        self.last_summary = None;
        self.play_token = self.recorder.game_started(GameId::Reflex);

        log::info!(
            "Reflex run started on {} ({}s)",
            difficulty.as_str(),
            self.round_secs
        );

        self.spawn(now);
        self.countdown = Some(
            self.timers
                .schedule_repeating(now, COUNTDOWN_INTERVAL_MS, ReflexEvent::Countdown),
        );
        true
    }

    /// Start button: start when idle, stop when running.
    /// Returns whether a run is active afterwards.
    pub fn toggle(&mut self, difficulty_key: &str, now: f64) -> bool {
        if self.run.active {
            self.stop();
        } else {
            self.start(difficulty_key, now);
        }
        self.run.active
    }

    /// End the run early. No-op when idle.
    pub fn stop(&mut self) -> Option<ReflexSummary> {
        if !self.run.active {
            return None;
        }
        Some(self.finish())
    }

    /// Fire every timer due at or before `now`.
    /// Returns the summary if the round ran out during this call.
    pub fn advance(&mut self, now: f64) -> Option<ReflexSummary> {
        let mut ended = None;
        while let Some(Fired { due, event, .. }) = self.timers.poll_due(now) {
            match event {
                ReflexEvent::Countdown => {
                    if let Some(summary) = self.tick_countdown() {
                        ended = Some(summary);
                    }
                }
                ReflexEvent::Spawn => self.spawn(due),
                ReflexEvent::Expire(id) => self.expire(id),
                ReflexEvent::Remove(id) => self.targets.retain(|t| t.id != id),
            }
        }
        ended
    }

    /// Hit a target by id. Each target can be hit once, and only while running.
    pub fn hit_target(&mut self, id: u32, now: f64) -> bool {
        if !self.run.active {
            return false;
        }
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id && t.is_active()) else {
            return false;
        };
        target.state = TargetState::Hit;

        let profile = self.difficulty.profile();
        self.run.hits += 1;
        self.run.score = self.run.score.saturating_add_signed(profile.points_per_hit);
        self.timers
            .schedule_once(now, HIT_REMOVAL_DELAY_MS, ReflexEvent::Remove(id));
        true
    }

    /// Pointer press at playfield coordinates; the newest target under the
    /// pointer takes the hit. Returns the id of the target hit.
    pub fn click(&mut self, x: f32, y: f32, now: f64) -> Option<u32> {
        let point = Vec2::new(x, y);
        let id = self
            .targets
            .iter()
            .rev()
            .find(|t| t.is_active() && t.contains(point))
            .map(|t| t.id)?;
        self.hit_target(id, now).then_some(id)
    }

    /// New playfield bounds, used by future spawns
    pub fn resize(&mut self, width: f32, height: f32) {
        self.playfield = Vec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn snapshot(&self) -> ReflexSnapshot<'_> {
        ReflexSnapshot {
            active: self.run.active,
            difficulty: self.difficulty,
            score: self.run.score,
            hits: self.run.hits,
            misses: self.run.misses,
            time_remaining: self.run.time_remaining,
            theme_color: self.difficulty.profile().theme_color,
            playfield: self.playfield,
            targets: &self.targets,
        }
    }

    /// Stored personal best for the current user on a difficulty
    pub fn best_score(&self, difficulty: Difficulty) -> u64 {
        self.recorder.best_score(GameId::Reflex, Some(difficulty))
    }

    /// Summary of the most recent finished run, handed out once
    pub fn take_summary(&mut self) -> Option<ReflexSummary> {
        self.last_summary.take()
    }

    fn spawn(&mut self, due: f64) {
        if !self.run.active {
            return;
        }
        let profile = self.difficulty.profile();
        let max_x = (self.playfield.x - profile.target_size).max(0.0);
        let max_y = (self.playfield.y - profile.target_size).max(0.0);
        let pos = Vec2::new(
            self.rng.random::<f32>() * max_x,
            self.rng.random::<f32>() * max_y,
        );

        let id = self.next_id;
        self.next_id += 1;
        self.targets.push(Target {
            id,
            pos,
            size: profile.target_size,
            spawned_at: due,
            state: TargetState::Active,
        });
        log::debug!("Target {} at ({:.0}, {:.0})", id, pos.x, pos.y);

        self.timers
            .schedule_once(due, profile.target_lifetime_ms, ReflexEvent::Expire(id));
        self.spawner = Some(
            self.timers
                .schedule_once(due, profile.spawn_interval_ms, ReflexEvent::Spawn),
        );
    }

    fn expire(&mut self, id: u32) {
        let Some(idx) = self.targets.iter().position(|t| t.id == id) else {
            return;
        };
        // Hit targets are cleaned up by their own removal timer
        if !self.targets[idx].is_active() {
            return;
        }
        self.targets[idx].state = TargetState::Expired;
        self.targets.remove(idx);

        if self.run.active {
            let penalty = self.difficulty.profile().miss_penalty;
            self.run.misses += 1;
            self.run.score = self.run.score.saturating_add_signed(penalty);
        }
    }

    fn tick_countdown(&mut self) -> Option<ReflexSummary> {
        if !self.run.active {
            return None;
        }
        self.run.time_remaining = self.run.time_remaining.saturating_sub(1);
        if self.run.time_remaining == 0 {
            Some(self.finish())
        } else {
            None
        }
    }

    fn finish(&mut self) -> ReflexSummary {
        self.run.active = false;
        if let Some(id) = self.countdown.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.spawner.take() {
            self.timers.cancel(id);
        }
        self.targets.clear();

        let RunState {
            score, hits, misses, ..
        } = self.run;
        let outcome = self
            .recorder
            .record(GameId::Reflex, Some(self.difficulty), score);
        let token = self.play_token.take();
        self.recorder.game_ended(GameId::Reflex, score, token);

        log::info!(
            "Reflex run over: {} points ({} hit, {} missed)",
            score,
            hits,
            misses
        );

        let summary = ReflexSummary {
            difficulty: self.difficulty,
            score,
            hits,
            misses,
            outcome,
        };
        self.last_summary = Some(summary.clone());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ReflexEngine {
        ReflexEngine::new(ScoreRecorder::guest(), 7)
    }

    #[test]
    fn test_start_spawns_immediately() {
        let mut game = engine();
        assert!(game.start("easy", 0.0));
        let snap = game.snapshot();
        assert!(snap.active);
        assert_eq!(snap.targets.len(), 1);
        assert_eq!(snap.time_remaining, REFLEX_ROUND_SECS);
        assert_eq!(snap.theme_color, "#4CAF50");
    }

    #[test]
    fn test_unknown_difficulty_is_ignored() {
        let mut game = engine();
        assert!(!game.start("nightmare", 0.0));
        assert!(!game.is_running());
        assert!(game.snapshot().targets.is_empty());
    }

    #[test]
    fn test_second_start_is_ignored() {
        let mut game = engine();
        assert!(game.start("hard", 0.0));
        assert!(!game.start("easy", 10.0));
        assert_eq!(game.difficulty(), Difficulty::Hard);
        assert_eq!(game.snapshot().targets.len(), 1);
    }

    #[test]
    fn test_targets_fit_playfield() {
        let mut game = engine();
        game.resize(300.0, 200.0);
        game.start("easy", 0.0);
        game.advance(15_000.0);
        for target in game.snapshot().targets {
            assert!(target.pos.x >= 0.0 && target.pos.x <= 200.0);
            assert!(target.pos.y >= 0.0 && target.pos.y <= 100.0);
        }
    }

    #[test]
    fn test_tiny_playfield_pins_targets_to_origin() {
        let mut game = engine();
        game.resize(50.0, 50.0);
        game.start("easy", 0.0);
        assert_eq!(game.snapshot().targets[0].pos, Vec2::ZERO);
    }

    #[test]
    fn test_hit_once_then_removed() {
        let mut game = engine();
        game.start("medium", 0.0);
        let id = game.snapshot().targets[0].id;

        assert!(game.hit_target(id, 100.0));
        assert!(!game.hit_target(id, 120.0));
        assert_eq!(game.snapshot().score, 20);
        assert_eq!(game.snapshot().hits, 1);

        // Still visible during the removal delay
        game.advance(250.0);
        assert_eq!(game.snapshot().targets[0].state, TargetState::Hit);
        game.advance(300.0);
        assert!(game.snapshot().targets.iter().all(|t| t.id != id));

        // Its expiry later is not a miss
        game.advance(2000.0);
        assert_eq!(game.snapshot().misses, 0);
    }

    #[test]
    fn test_click_hits_target_under_pointer() {
        let mut game = engine();
        game.start("easy", 0.0);
        let target = game.snapshot().targets[0].clone();
        let center = target.center();

        assert_eq!(game.click(center.x, center.y, 10.0), Some(target.id));
        assert_eq!(game.click(center.x, center.y, 20.0), None);
        assert_eq!(game.snapshot().score, 10);
    }

    #[test]
    fn test_misses_never_push_score_negative() {
        let mut game = engine();
        game.start("hard", 0.0);
        // Hard: spawn every 700ms, each lives 1000ms
        game.advance(5000.0);
        let snap = game.snapshot();
        assert!(snap.misses > 0);
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn test_round_ends_on_countdown() {
        let mut game = engine().with_round_secs(3);
        game.start("easy", 0.0);
        assert!(game.advance(2000.0).is_none());

        let summary = game.advance(3000.0).unwrap();
        assert_eq!(summary.difficulty, Difficulty::Easy);
        assert_eq!(summary.outcome, RecordOutcome::Guest);
        assert!(!game.is_running());
        assert!(game.snapshot().targets.is_empty());
        assert_eq!(game.take_summary(), Some(summary));
        assert_eq!(game.take_summary(), None);

        // Nothing fires after the end
        game.advance(60_000.0);
        assert!(game.snapshot().targets.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut game = engine();
        assert!(game.toggle("easy", 0.0));
        assert!(!game.toggle("easy", 500.0));
        assert!(game.take_summary().is_some());
        assert!(game.stop().is_none());
    }
}
