//! Game simulation module
//!
//! All gameplay logic lives here. Engines are driven with explicit timestamps:
//! - Timers live in an engine-owned `TimerQueue`, cancelled on every transition
//! - Seeded RNG only
//! - Output is a snapshot; no rendering or DOM dependencies

pub mod collision;
pub mod physics;
pub mod ramp;
pub mod reflex;
pub mod scroller;
pub mod state;

pub use collision::{Rect, bird_hits_obstacle, circle_rect_collision};
pub use physics::Boundary;
pub use ramp::{DifficultyRamp, RampStep};
pub use reflex::{ReflexEngine, ReflexSnapshot, ReflexSummary};
pub use scroller::{EndReason, ScrollerEngine, ScrollerPhase, ScrollerSnapshot, ScrollerSummary};
pub use state::{Bird, Obstacle, Target, TargetState, Viewport};
