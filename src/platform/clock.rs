//! Wall-clock access
//!
//! Engines take explicit timestamps; only persistence and stats need the wall
//! clock, for leaderboard dates and play durations.

use std::cell::Cell;

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// The real clock (`Date.now()` in the browser)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven clock for tests and headless runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(now_ms: f64) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Format epoch milliseconds as UTC ISO-8601 with milliseconds
/// (`2024-03-09T14:05:00.000Z`)
pub fn iso8601(epoch_ms: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms.floor() as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_epoch() {
        assert_eq!(iso8601(0.0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_iso8601_known_instants() {
        assert_eq!(iso8601(1_700_000_000_000.0), "2023-11-14T22:13:20.000Z");
        // Leap day
        assert_eq!(iso8601(951_782_400_123.0), "2000-02-29T00:00:00.123Z");
    }

    #[test]
    fn test_iso8601_out_of_range_is_epoch() {
        assert_eq!(iso8601(f64::MAX), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1000.0);
        clock.advance(500.0);
        assert_eq!(clock.now_ms(), 1500.0);
        clock.set(10.0);
        assert_eq!(clock.now_ms(), 10.0);
    }
}
