//! Side-scroller game
//!
//! Features:
//! - Gravity and jump physics on a single bird
//! - Obstacles spawn on a timer, scroll left and score once when passed
//! - Scroll speed ramps up in levels until the expert tier
//! - Floor or obstacle contact ends the run; the best score is persisted

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::bird_hits_obstacle;
use super::physics::{self, Boundary};
use super::ramp::DifficultyRamp;
use super::state::{Bird, Obstacle, Viewport};
use crate::GameId;
use crate::consts::LEVEL_BANNER_MS;
use crate::persistence::{RecordOutcome, ScoreRecorder};
use crate::platform::scheduler::{FrameClock, TimerId, TimerQueue};
use crate::stats::PlayToken;
use crate::tuning::{RampTuning, ScrollerTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollerPhase {
    Idle,
    Running,
    /// The last run hit something; behaves like `Idle`
    Crashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollerEvent {
    SpawnObstacle,
    Ramp,
    HideBanner,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Crashed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollerSummary {
    pub score: u32,
    /// Personal best after this run
    pub best: u64,
    pub reason: EndReason,
    pub outcome: RecordOutcome,
}

/// Read-only view for rendering and the HUD
#[derive(Debug, Clone)]
pub struct ScrollerSnapshot<'a> {
    pub phase: ScrollerPhase,
    pub viewport: Viewport,
    pub bird: &'a Bird,
    pub obstacles: &'a [Obstacle],
    pub score: u32,
    pub best: u64,
    pub level: u32,
    pub expert: bool,
    /// Badge text (`Level: 3`, `Level: EXPERT`)
    pub level_label: String,
    /// Transient level-up banner, if showing
    pub banner: Option<&'a str>,
}

pub struct ScrollerEngine {
    phase: ScrollerPhase,
    tuning: ScrollerTuning,
    viewport: Viewport,
    bird: Bird,
    obstacles: Vec<Obstacle>,
    score: u32,
    best: u64,
    ramp: DifficultyRamp,
    banner: Option<String>,
    timers: TimerQueue<ScrollerEvent>,
    spawner: Option<TimerId>,
    ramp_timer: Option<TimerId>,
    banner_timer: Option<TimerId>,
    frames: FrameClock,
    rng: Pcg32,
    next_id: u32,
    recorder: ScoreRecorder,
    play_token: Option<PlayToken>,
    last_summary: Option<ScrollerSummary>,
}

impl ScrollerEngine {
    pub fn new(recorder: ScoreRecorder, width: f32, height: f32, seed: u64) -> Self {
        Self::with_tuning(
            recorder,
            width,
            height,
            seed,
            ScrollerTuning::default(),
            RampTuning::default(),
        )
    }

    pub fn with_tuning(
        recorder: ScoreRecorder,
        width: f32,
        height: f32,
        seed: u64,
        tuning: ScrollerTuning,
        ramp: RampTuning,
    ) -> Self {
        let viewport = Viewport::fit(width, height);
        let best = recorder.best_score(GameId::Scroller, None);
        Self {
            phase: ScrollerPhase::Idle,
            bird: Bird::new(tuning.bird_radius, &viewport),
            tuning,
            viewport,
            obstacles: Vec::new(),
            score: 0,
            best,
            ramp: DifficultyRamp::new(ramp),
            banner: None,
            timers: TimerQueue::new(),
            spawner: None,
            ramp_timer: None,
            banner_timer: None,
            frames: FrameClock::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            recorder,
            play_token: None,
            last_summary: None,
        }
    }

    pub fn phase(&self) -> ScrollerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == ScrollerPhase::Running
    }

    /// Begin a run. Ignored while running.
    pub fn start(&mut self, now: f64) -> bool {
        if self.is_running() {
            return false;
        }

        self.phase = ScrollerPhase::Running;
        self.score = 0;
        self.obstacles.clear();
        self.ramp.reset();
        self.banner = None;
        self.timers.clear();
        self.last_summary = None;
        self.best = self.recorder.best_score(GameId::Scroller, None);
        self.bird.reset(&self.viewport);
        self.play_token = self.recorder.game_started(GameId::Scroller);

        self.spawn_obstacle();
        self.spawner = Some(self.timers.schedule_repeating(
            now,
            self.tuning.spawn_interval_ms,
            ScrollerEvent::SpawnObstacle,
        ));
        self.ramp_timer = Some(self.timers.schedule_repeating(
            now,
            self.ramp.interval_ms(),
            ScrollerEvent::Ramp,
        ));
        self.frames.start(now);

        log::info!("Scroller run started (best {})", self.best);
        true
    }

    /// Start button: start when resting, stop when running.
    /// Returns whether a run is active afterwards.
    pub fn toggle(&mut self, now: f64) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start(now);
        }
        self.is_running()
    }

    /// User stop; ends in `Idle`
    pub fn stop(&mut self) -> Option<ScrollerSummary> {
        if !self.is_running() {
            return None;
        }
        Some(self.end(EndReason::Stopped))
    }

    pub fn jump(&mut self) {
        if self.is_running() {
            physics::jump(&mut self.bird, self.tuning.jump_velocity);
        }
    }

    /// Fire due spawn, ramp and banner timers
    pub fn advance(&mut self, now: f64) {
        while let Some(fired) = self.timers.poll_due(now) {
            match fired.event {
                // Spawns missed during a stall collapse into the latest one
                ScrollerEvent::SpawnObstacle => {
                    if now - fired.due <= self.tuning.spawn_interval_ms {
                        self.spawn_obstacle();
                    }
                }
                ScrollerEvent::Ramp => self.step_ramp(fired.due),
                ScrollerEvent::HideBanner => {
                    self.banner = None;
                    self.banner_timer = None;
                }
            }
        }
    }

    /// One animation frame. Returns the summary if the bird crashed.
    pub fn frame(&mut self, now: f64) -> Option<ScrollerSummary> {
        if !self.is_running() {
            return None;
        }
        let dt = self.frames.delta(now)?;

        if physics::step(&mut self.bird, self.tuning.gravity, dt, self.viewport.height)
            == Boundary::Floor
        {
            return Some(self.end(EndReason::Crashed));
        }

        let shift = self.ramp.speed() * dt;
        for obstacle in &mut self.obstacles {
            obstacle.x -= shift;
            if !obstacle.scored && obstacle.trailing_edge() < self.bird.pos.x {
                obstacle.scored = true;
                self.score += 1;
            }
        }

        let tolerance = self.tuning.offscreen_tolerance;
        self.obstacles.retain(|o| o.trailing_edge() > -tolerance);

        let height = self.viewport.height;
        if self
            .obstacles
            .iter()
            .any(|o| bird_hits_obstacle(&self.bird, o, height))
        {
            return Some(self.end(EndReason::Crashed));
        }
        None
    }

    /// Host tick: timers first, then physics
    pub fn update(&mut self, now: f64) -> Option<ScrollerSummary> {
        self.advance(now);
        self.frame(now)
    }

    /// Container resized. A running bird is kept inside; a resting one is reset.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::fit(width, height);
        self.bird.pos.x = self.viewport.bird_anchor_x();
        if self.is_running() {
            physics::clamp_inside(&mut self.bird, &self.viewport);
        } else {
            self.bird.reset(&self.viewport);
        }
    }

    pub fn snapshot(&self) -> ScrollerSnapshot<'_> {
        ScrollerSnapshot {
            phase: self.phase,
            viewport: self.viewport,
            bird: &self.bird,
            obstacles: &self.obstacles,
            score: self.score,
            best: self.best,
            level: self.ramp.level(),
            expert: self.ramp.is_expert(),
            level_label: self.ramp.label(),
            banner: self.banner.as_deref(),
        }
    }

    /// Summary of the most recent finished run, handed out once
    pub fn take_summary(&mut self) -> Option<ScrollerSummary> {
        self.last_summary.take()
    }

    fn spawn_obstacle(&mut self) {
        if !self.is_running() {
            return;
        }
        let t = &self.tuning;
        let min_top = t.gap_margin;
        let max_top = (self.viewport.height - t.gap_height - t.gap_margin).max(min_top);
        let gap_top = self.rng.random::<f32>() * (max_top - min_top) + min_top;

        // Keep at least one spawn interval of travel behind the newest obstacle
        let spacing = self.ramp.speed() * (t.spawn_interval_ms / 1000.0) as f32;
        let x = self
            .obstacles
            .last()
            .map_or(f32::MIN, |o| o.x + spacing)
            .max(self.viewport.width + t.spawn_offset);

        let id = self.next_id;
        self.next_id += 1;
        self.obstacles.push(Obstacle {
            id,
            x,
            width: t.obstacle_width,
            gap_top,
            gap_height: t.gap_height,
            scored: false,
        });
        log::debug!("Obstacle {} at x {:.0} with gap at {:.0}", id, x, gap_top);
    }

    fn step_ramp(&mut self, due: f64) {
        if !self.is_running() {
            return;
        }
        let step = self.ramp.step();
        let Some(text) = step.banner() else {
            return;
        };
        log::info!("{} (speed {:.0})", text, self.ramp.speed());

        if let Some(id) = self.banner_timer.take() {
            self.timers.cancel(id);
        }
        self.banner = Some(text);
        self.banner_timer = Some(
            self.timers
                .schedule_once(due, LEVEL_BANNER_MS, ScrollerEvent::HideBanner),
        );
    }

    fn end(&mut self, reason: EndReason) -> ScrollerSummary {
        self.phase = match reason {
            EndReason::Crashed => ScrollerPhase::Crashed,
            EndReason::Stopped => ScrollerPhase::Idle,
        };
        self.frames.stop();
        self.timers.clear();
        self.spawner = None;
        self.ramp_timer = None;
        self.banner_timer = None;
        self.banner = None;
        self.ramp.reset();

        let score = self.score;
        let outcome = self
            .recorder
            .record(GameId::Scroller, None, u64::from(score));
        self.best = self.recorder.best_score(GameId::Scroller, None);
        let token = self.play_token.take();
        self.recorder
            .game_ended(GameId::Scroller, u64::from(score), token);

        log::info!("Scroller run over ({:?}): {} points", reason, score);

        let summary = ScrollerSummary {
            score,
            best: self.best,
            reason,
            outcome,
        };
        self.last_summary = Some(summary.clone());
        summary
    }
}
