// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Precise scheduler abstraction and a virtual clock implementing it.
//!
//! The clock owns cumulative elapsed time in seconds. Callbacks are not
//! invoked directly; instead the clock hands out [`ClockTick`]s in time
//! order, each stamped with the exact time it was scheduled for, and the
//! owner dispatches them one at a time. This keeps callback delivery
//! sequential without shared mutable state.

use crate::pattern::DEFAULT_BPM;

use super::TIME_EPSILON;

/// Handle for a registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleId(pub(crate) u64);

/// A callback that has come due
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Which schedule fired
    pub id: ScheduleId,
    /// Exact clock time the callback was scheduled for, in seconds
    pub time: f64,
}

/// Trait for precise real-time schedulers.
///
/// Positions and delays are in seconds of transport time. Schedules are
/// relative to the position at the moment they are registered.
pub trait PreciseScheduler {
    /// Register a repeating callback: first at `position + start_offset`,
    /// then every `interval`
    fn schedule_repeating(&mut self, interval: f64, start_offset: f64) -> ScheduleId;

    /// Register a single callback at `position + delay`
    fn schedule_once(&mut self, delay: f64) -> ScheduleId;

    /// Remove a callback; unknown handles are ignored
    fn cancel(&mut self, id: ScheduleId);

    /// Cumulative elapsed time
    fn position(&self) -> f64;

    /// Move the clock. Pending schedules are not moved with it.
    fn set_position(&mut self, seconds: f64);

    fn start(&mut self);

    /// Halt the clock, keeping its position
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Tempo hint for clocks that also keep musical time
    fn set_bpm(&mut self, bpm: u16);

    /// Pop the earliest callback due at or before `until`, moving the
    /// clock to its time. Returns None when stopped or nothing is due.
    fn next_due(&mut self, until: f64) -> Option<ClockTick>;

    /// Move a running clock forward to `until`
    fn advance_to(&mut self, until: f64);
}

#[derive(Debug, Clone)]
struct Schedule {
    id: ScheduleId,
    /// Time of the first callback
    origin: f64,
    /// None for one-shot callbacks
    interval: Option<f64>,
    /// Callbacks already delivered
    fired: u64,
}

impl Schedule {
    /// Next fire time, computed from the origin so repeats never drift
    fn next_fire(&self) -> f64 {
        match self.interval {
            Some(interval) => self.origin + self.fired as f64 * interval,
            None => self.origin,
        }
    }
}

/// Virtual precise clock.
///
/// Time only moves when the owner calls [`PreciseScheduler::advance_to`]
/// (or pops ticks), so it can be driven by a real-time loop or stepped
/// deterministically in tests.
#[derive(Debug, Clone)]
pub struct TransportClock {
    position: f64,
    running: bool,
    bpm: u16,
    next_id: u64,
    schedules: Vec<Schedule>,
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportClock {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            running: false,
            bpm: DEFAULT_BPM,
            next_id: 0,
            schedules: Vec::new(),
        }
    }

    /// Tempo last set on the clock
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Number of registered callbacks
    pub fn scheduled_count(&self) -> usize {
        self.schedules.len()
    }

    /// Whether a handle is still registered
    pub fn is_scheduled(&self, id: ScheduleId) -> bool {
        self.schedules.iter().any(|s| s.id == id)
    }

    fn register(&mut self, origin: f64, interval: Option<f64>) -> ScheduleId {
        let id = ScheduleId(self.next_id);
        self.next_id += 1;
        self.schedules.push(Schedule {
            id,
            origin,
            interval,
            fired: 0,
        });
        id
    }
}

impl PreciseScheduler for TransportClock {
    fn schedule_repeating(&mut self, interval: f64, start_offset: f64) -> ScheduleId {
        let origin = self.position + start_offset.max(0.0);
        self.register(origin, Some(interval.max(TIME_EPSILON)))
    }

    fn schedule_once(&mut self, delay: f64) -> ScheduleId {
        let origin = self.position + delay.max(0.0);
        self.register(origin, None)
    }

    fn cancel(&mut self, id: ScheduleId) {
        self.schedules.retain(|s| s.id != id);
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_bpm(&mut self, bpm: u16) {
        self.bpm = bpm;
    }

    fn next_due(&mut self, until: f64) -> Option<ClockTick> {
        if !self.running {
            return None;
        }

        // Earliest fire time first, registration order breaks ties
        let index = self
            .schedules
            .iter()
            .enumerate()
            .filter(|(_, s)| s.next_fire() <= until + TIME_EPSILON)
            .min_by(|(_, a), (_, b)| {
                a.next_fire()
                    .total_cmp(&b.next_fire())
                    .then(a.id.cmp(&b.id))
            })
            .map(|(index, _)| index)?;

        let schedule = &mut self.schedules[index];
        let tick = ClockTick {
            id: schedule.id,
            time: schedule.next_fire(),
        };
        if schedule.interval.is_some() {
            schedule.fired += 1;
        } else {
            self.schedules.remove(index);
        }

        self.position = self.position.max(tick.time);
        Some(tick)
    }

    fn advance_to(&mut self, until: f64) {
        if self.running && until > self.position {
            self.position = until;
        }
    }
}
