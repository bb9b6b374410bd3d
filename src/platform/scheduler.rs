//! Explicit timer scheduling for the game engines
//!
//! Engines never register free-floating callbacks. Every pending action is a
//! typed event sitting in a `TimerQueue` owned by the engine, addressed by a
//! `TimerId` that can be cancelled on state transitions. The host drives the
//! queue by polling it with the current time (once per animation frame in the
//! browser, with explicit timestamps in tests).

use crate::consts::MAX_FRAME_DT;

/// Smallest accepted repeat interval; keeps `poll_due` loops finite
const MIN_REPEAT_MS: f64 = 1.0;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    due: f64,
    interval: Option<f64>,
    /// Tie-breaker so timers due at the same instant fire in scheduling order
    order: u64,
    event: E,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// When the timer was scheduled to fire (not when it was polled)
    pub due: f64,
    pub event: E,
}

/// Deterministic queue of one-shot and repeating timers
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    timers: Vec<Timer<E>>,
    next_id: u64,
    next_order: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
            next_order: 0,
        }
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` once, `delay_ms` after `now`
    pub fn schedule_once(&mut self, now: f64, delay_ms: f64, event: E) -> TimerId {
        self.push(now + delay_ms.max(0.0), None, event)
    }

    /// Fire `event` every `interval_ms`, first firing one interval after `now`
    pub fn schedule_repeating(&mut self, now: f64, interval_ms: f64, event: E) -> TimerId {
        let interval = interval_ms.max(MIN_REPEAT_MS);
        self.push(now + interval, Some(interval), event)
    }

    /// Cancel a timer. Returns false if it was not pending (already fired or
    /// cancelled), which is not an error.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Whether the timer will still fire
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Repeating timers are re-armed at `due + interval`, so a slow poller
    /// catches up with one firing per call instead of drifting.
    pub fn poll_due(&mut self, now: f64) -> Option<Fired<E>> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| {
                a.due
                    .partial_cmp(&b.due)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.order.cmp(&b.order))
            })
            .map(|(i, _)| i)?;

        match self.timers[idx].interval {
            Some(interval) => {
                let order = self.bump_order();
                let timer = &mut self.timers[idx];
                let due = timer.due;
                timer.due += interval;
                timer.order = order;
                Some(Fired {
                    id: timer.id,
                    due,
                    event: timer.event.clone(),
                })
            }
            None => {
                let timer = self.timers.swap_remove(idx);
                Some(Fired {
                    id: timer.id,
                    due: timer.due,
                    event: timer.event,
                })
            }
        }
    }

    /// Time of the next firing, if anything is pending
    pub fn next_due(&self) -> Option<f64> {
        self.timers
            .iter()
            .map(|t| t.due)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    fn push(&mut self, due: f64, interval: Option<f64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let order = self.bump_order();
        self.timers.push(Timer {
            id,
            due,
            interval,
            order,
            event,
        });
        id
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

/// Animation-frame delta tracker
///
/// Turns raw frame timestamps into clamped physics steps so a resumed tab or
/// a dropped frame cannot produce one huge integration step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last_ms: None,
            max_dt,
        }
    }

    /// Begin the frame loop at `now`
    pub fn start(&mut self, now: f64) {
        self.last_ms = Some(now);
    }

    /// Cancel the frame loop; later frames yield nothing
    pub fn stop(&mut self) {
        self.last_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.last_ms.is_some()
    }

    /// Seconds since the previous frame, clamped to `[0, max_dt]`
    pub fn delta(&mut self, now: f64) -> Option<f32> {
        let last = self.last_ms?;
        self.last_ms = Some(now);
        let dt = ((now - last) / 1000.0).max(0.0) as f32;
        Some(dt.min(self.max_dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Ev {
        A,
        B,
        Tick,
    }

    #[test]
    fn test_once_fires_once() {
        let mut q = TimerQueue::new();
        q.schedule_once(0.0, 100.0, Ev::A);

        assert!(q.poll_due(99.0).is_none());
        let fired = q.poll_due(150.0).unwrap();
        assert_eq!(fired.event, Ev::A);
        assert_eq!(fired.due, 100.0);
        assert!(q.poll_due(1000.0).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_repeating_keeps_cadence() {
        let mut q = TimerQueue::new();
        q.schedule_repeating(0.0, 1000.0, Ev::Tick);

        // Polling late still yields one firing per interval elapsed
        let mut fired = 0;
        while q.poll_due(3500.0).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(q.next_due(), Some(4000.0));
    }

    #[test]
    fn test_cancel_prevents_future_firings() {
        let mut q = TimerQueue::new();
        let id = q.schedule_repeating(0.0, 10.0, Ev::Tick);
        assert!(q.poll_due(10.0).is_some());

        assert!(q.cancel(id));
        assert!(!q.is_pending(id));
        assert!(q.poll_due(100.0).is_none());
        // Second cancel is harmless
        assert!(!q.cancel(id));
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule_once(0.0, 50.0, Ev::B);
        q.schedule_once(0.0, 50.0, Ev::A);

        assert_eq!(q.poll_due(50.0).map(|f| f.event), Some(Ev::B));
        assert_eq!(q.poll_due(50.0).map(|f| f.event), Some(Ev::A));
    }

    #[test]
    fn test_earliest_due_first() {
        let mut q = TimerQueue::new();
        q.schedule_once(0.0, 300.0, Ev::A);
        q.schedule_once(0.0, 100.0, Ev::B);

        assert_eq!(q.poll_due(500.0).map(|f| f.event), Some(Ev::B));
        assert_eq!(q.poll_due(500.0).map(|f| f.event), Some(Ev::A));
    }

    #[test]
    fn test_frame_clock_clamps_delta() {
        let mut clock = FrameClock::default();
        assert!(clock.delta(16.0).is_none());

        clock.start(0.0);
        let dt = clock.delta(16.0).unwrap();
        assert!((dt - 0.016).abs() < 1e-6);

        // Tab resumed after 5 seconds
        let dt = clock.delta(5016.0).unwrap();
        assert!((dt - MAX_FRAME_DT).abs() < 1e-6);

        // Out-of-order timestamp never integrates backwards
        assert_eq!(clock.delta(5000.0), Some(0.0));

        clock.stop();
        assert!(clock.delta(6000.0).is_none());
    }
}
