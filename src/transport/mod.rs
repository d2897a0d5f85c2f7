// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback transport.
//!
//! This module provides:
//! - A precise scheduler abstraction and a virtual clock implementing it
//! - Step timing math derived from tempo and subdivision
//! - The play/pause/stop/seek state machine driving audio triggers

pub mod clock;
pub mod scheduler;

pub use clock::{ClockTick, PreciseScheduler, ScheduleId, TransportClock};
pub use scheduler::{PlayheadFrame, StepCommit, Transport, TransportSnapshot};

use crate::pattern::Subdivision;

/// Tolerance for deciding that a position sits on a step boundary
pub const TIME_EPSILON: f64 = 1e-9;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, TransportState::Paused)
    }
}

/// Step grid timing for one tempo and subdivision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTiming {
    /// Tempo in BPM
    pub bpm: u16,
    /// Grid subdivision
    pub subdivision: Subdivision,
    /// Steps in the whole pattern
    pub total_steps: usize,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            bpm: crate::pattern::DEFAULT_BPM,
            subdivision: Subdivision::default(),
            total_steps: Subdivision::default().total_steps(1),
        }
    }
}

impl StepTiming {
    pub fn new(bpm: u16, subdivision: Subdivision, total_steps: usize) -> Self {
        Self {
            bpm,
            subdivision,
            total_steps: total_steps.max(1),
        }
    }

    /// Seconds per step
    pub fn step_duration(&self) -> f64 {
        self.subdivision.step_duration(self.bpm as f64)
    }

    /// Seconds per pass through the whole pattern
    pub fn loop_duration(&self) -> f64 {
        self.step_duration() * self.total_steps as f64
    }

    /// Whole steps elapsed at `position`, not wrapped
    fn steps_elapsed(&self, position: f64) -> usize {
        (position.max(0.0) / self.step_duration() + TIME_EPSILON).floor() as usize
    }

    /// Step index playing at `position` seconds: floor(position / step) mod total
    pub fn step_at(&self, position: f64) -> usize {
        self.steps_elapsed(position) % self.total_steps
    }

    /// Fraction of the current step already played, in 0..1
    pub fn step_progress(&self, position: f64) -> f64 {
        let steps = position.max(0.0) / self.step_duration();
        (steps - self.steps_elapsed(position) as f64).clamp(0.0, 1.0)
    }

    /// Position of the start of `step` within the first pass
    pub fn time_of_step(&self, step: usize) -> f64 {
        step as f64 * self.step_duration()
    }

    /// Whether `position` lies on a step boundary
    pub fn is_aligned(&self, position: f64) -> bool {
        let duration = self.step_duration();
        let into_step = position.max(0.0) % duration;
        into_step < TIME_EPSILON || duration - into_step < TIME_EPSILON
    }

    /// Seconds until the next step boundary; zero when already on one
    pub fn time_to_next_step(&self, position: f64) -> f64 {
        if self.is_aligned(position) {
            0.0
        } else {
            self.step_duration() - position.max(0.0) % self.step_duration()
        }
    }

    /// Index of the step that starts at the next boundary, before wrapping.
    ///
    /// Equals `total_steps` when the next boundary is the end of the pattern.
    pub fn next_boundary_step(&self, position: f64) -> usize {
        let current = self.step_at(position);
        if self.is_aligned(position) {
            current
        } else {
            current + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sixteenths() -> StepTiming {
        StepTiming::new(120, Subdivision::Sixteenth, 16)
    }

    #[test]
    fn test_step_duration() {
        let timing = sixteenths();
        assert!((timing.step_duration() - 0.125).abs() < 1e-12);
        assert!((timing.loop_duration() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_at_wraps() {
        let timing = sixteenths();
        assert_eq!(timing.step_at(0.0), 0);
        assert_eq!(timing.step_at(0.124), 0);
        assert_eq!(timing.step_at(0.375), 3);
        assert_eq!(timing.step_at(2.0), 0);
        assert_eq!(timing.step_at(2.26), 2);
    }

    #[test]
    fn test_time_to_next_step() {
        let timing = sixteenths();
        assert_eq!(timing.time_to_next_step(0.0), 0.0);
        assert_eq!(timing.time_to_next_step(0.25), 0.0);
        assert!((timing.time_to_next_step(0.3) - 0.075).abs() < 1e-9);
    }

    #[test]
    fn test_next_boundary_step() {
        let timing = sixteenths();
        assert_eq!(timing.next_boundary_step(0.0), 0);
        assert_eq!(timing.next_boundary_step(0.3), 3);
        assert_eq!(timing.next_boundary_step(1.9), 16);
    }

    #[test]
    fn test_step_progress() {
        let timing = sixteenths();
        assert!((timing.step_progress(0.1875) - 0.5).abs() < 1e-9);
        assert_eq!(timing.step_progress(0.25), 0.0);
    }

    #[test]
    fn test_triplet_timing() {
        let timing = StepTiming::new(90, Subdivision::QuarterTriplet, 6);
        // 1.5 steps per beat at 90 BPM: 60 / 90 / 1.5 seconds per step
        assert!((timing.step_duration() - 60.0 / 90.0 / 1.5).abs() < 1e-12);
        assert_eq!(timing.step_at(timing.time_of_step(5)), 5);
    }

    #[test]
    fn test_state_flags() {
        assert!(TransportState::Playing.is_playing());
        assert!(!TransportState::Paused.is_playing());
        assert!(TransportState::Paused.is_paused());
        assert_eq!(TransportState::default(), TransportState::Stopped);
    }
}
