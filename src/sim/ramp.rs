//! Scroll-speed ramp for the side-scroller
//!
//! Every ramp interval the speed grows by a fixed factor until it reaches the
//! cap. Each step below the cap is a new level; reaching the cap switches to
//! the expert tier for the rest of the run.

use crate::clamp_lenient;
use crate::tuning::RampTuning;

/// Distance from the cap at which the speed counts as maxed out
const EXPERT_EPSILON: f32 = 0.01;

/// Result of one ramp firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampStep {
    /// Reached a new numbered level
    Level(u32),
    /// Hit the speed cap on this firing
    Expert,
    /// Already expert; nothing changed
    Unchanged,
}

impl RampStep {
    /// Banner text for the step, if one should be shown
    pub fn banner(&self) -> Option<String> {
        match self {
            RampStep::Level(n) => Some(format!("Level: {}", n)),
            RampStep::Expert => Some("Level: EXPERT".to_string()),
            RampStep::Unchanged => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DifficultyRamp {
    tuning: RampTuning,
    speed: f32,
    level: u32,
    expert: bool,
}

impl DifficultyRamp {
    pub fn new(tuning: RampTuning) -> Self {
        Self {
            speed: tuning.start_speed,
            tuning,
            level: 1,
            expert: false,
        }
    }

    /// Back to level 1 at the starting speed
    pub fn reset(&mut self) {
        self.speed = self.tuning.start_speed;
        self.level = 1;
        self.expert = false;
    }

    pub fn step(&mut self) -> RampStep {
        if self.expert {
            return RampStep::Unchanged;
        }

        let t = &self.tuning;
        self.speed = clamp_lenient(self.speed * t.growth.max(1.0), t.min_speed, t.max_speed);

        if (t.max_speed - self.speed).abs() < EXPERT_EPSILON || self.speed >= t.max_speed {
            self.expert = true;
            RampStep::Expert
        } else {
            self.level += 1;
            RampStep::Level(self.level)
        }
    }

    /// Scroll speed in px/s
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_expert(&self) -> bool {
        self.expert
    }

    /// Badge text for the current tier
    pub fn label(&self) -> String {
        if self.expert {
            "Level: EXPERT".to_string()
        } else {
            format!("Level: {}", self.level)
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.tuning.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_step_is_level_two() {
        let mut ramp = DifficultyRamp::new(RampTuning::default());
        assert_eq!(ramp.step(), RampStep::Level(2));
        assert!((ramp.speed() - 231.0).abs() < 1e-3);
        assert_eq!(ramp.label(), "Level: 2");
    }

    #[test]
    fn test_fast_growth_caps_on_sixth_step() {
        let tuning = RampTuning {
            growth: 1.3,
            ..RampTuning::default()
        };
        let mut ramp = DifficultyRamp::new(tuning);
        for expected in 2..=6 {
            assert_eq!(ramp.step(), RampStep::Level(expected));
        }
        assert_eq!(ramp.step(), RampStep::Expert);
        assert_eq!(ramp.speed(), 820.0);
        assert_eq!(ramp.step(), RampStep::Unchanged);
        assert_eq!(ramp.speed(), 820.0);
    }

    #[test]
    fn test_default_growth_caps_on_fifteenth_step() {
        let mut ramp = DifficultyRamp::new(RampTuning::default());
        for _ in 0..14 {
            assert!(matches!(ramp.step(), RampStep::Level(_)));
        }
        assert_eq!(ramp.level(), 15);
        assert_eq!(ramp.step(), RampStep::Expert);
        assert!(ramp.is_expert());
        assert_eq!(ramp.label(), "Level: EXPERT");
        assert_eq!(ramp.step().banner(), None);
    }

    #[test]
    fn test_reset() {
        let mut ramp = DifficultyRamp::new(RampTuning::default());
        ramp.step();
        ramp.step();
        ramp.reset();
        assert_eq!(ramp.level(), 1);
        assert_eq!(ramp.speed(), 210.0);
        assert!(!ramp.is_expert());
    }

    #[test]
    fn test_banner_text() {
        assert_eq!(RampStep::Level(3).banner().as_deref(), Some("Level: 3"));
        assert_eq!(RampStep::Expert.banner().as_deref(), Some("Level: EXPERT"));
    }

    proptest! {
        #[test]
        fn prop_speed_monotone_and_capped(growth in 1.0f32..2.0, steps in 1usize..40) {
            let tuning = RampTuning { growth, ..RampTuning::default() };
            let mut ramp = DifficultyRamp::new(tuning);
            let mut last = ramp.speed();
            for _ in 0..steps {
                ramp.step();
                prop_assert!(ramp.speed() >= last);
                prop_assert!(ramp.speed() <= 820.0);
                last = ramp.speed();
            }
        }
    }
}
