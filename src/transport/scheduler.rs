// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport state machine.
//!
//! The clock's elapsed time is the only record of where playback is. The
//! transport keeps a step counter for the step about to be triggered, but
//! every time playback (re)starts that counter is re-derived from the
//! clock position, and the visible playhead is committed from tick
//! timestamps rather than counted.
//!
//! At most one repeating schedule and one stop schedule exist at any time:
//! handles are always cancelled before being replaced, and on every move
//! into Paused or Stopped.

use std::collections::VecDeque;

use tracing::{debug, info, trace};

use crate::audio::AudioTrigger;
use crate::pattern::{clamp_bpm, DrumPattern, DEFAULT_BPM};

use super::clock::{ClockTick, PreciseScheduler, ScheduleId, TransportClock};
use super::{StepTiming, TransportState, TIME_EPSILON};

/// A visible-step update waiting for the frame that reaches its timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCommit {
    pub step: usize,
    pub time: f64,
}

/// What the render loop should draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayheadFrame {
    /// Last step whose audio has been reached
    pub current_step: usize,
    /// Step under the clock position (floor(position / step) mod total)
    pub clock_step: usize,
    /// Clock position in seconds
    pub position: f64,
    /// Fraction of `clock_step` already played
    pub progress: f64,
}

/// Reactive transport state exposed to the surrounding application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSnapshot {
    pub is_playing: bool,
    pub is_paused: bool,
    pub current_step: usize,
    pub bpm: u16,
    pub is_looping: bool,
}

/// Play/pause/stop/seek engine over a precise scheduler
#[derive(Debug)]
pub struct Transport<C: PreciseScheduler = TransportClock> {
    clock: C,
    state: TransportState,
    timing: StepTiming,
    looping: bool,
    /// Visible step, updated through frame commits
    current_step: usize,
    /// Step the next repeating tick will trigger
    next_step: usize,
    /// Exact position captured by pause
    paused_at: Option<f64>,
    /// Time of the last step tick delivered
    last_tick: Option<f64>,
    /// Paused exactly on a boundary whose step already fired
    boundary_played: bool,
    repeat_id: Option<ScheduleId>,
    stop_id: Option<ScheduleId>,
    pending_commits: VecDeque<StepCommit>,
}

impl Default for Transport<TransportClock> {
    fn default() -> Self {
        Self::new(TransportClock::new())
    }
}

impl<C: PreciseScheduler> Transport<C> {
    /// Create a stopped, looping transport at the default tempo
    pub fn new(mut clock: C) -> Self {
        clock.set_bpm(DEFAULT_BPM);
        Self {
            clock,
            state: TransportState::Stopped,
            timing: StepTiming::default(),
            looping: true,
            current_step: 0,
            next_step: 0,
            paused_at: None,
            last_tick: None,
            boundary_played: false,
            repeat_id: None,
            stop_id: None,
            pending_commits: VecDeque::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn bpm(&self) -> u16 {
        self.timing.bpm
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Visible step
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn timing(&self) -> &StepTiming {
        &self.timing
    }

    /// Exact playback position in seconds
    pub fn position(&self) -> f64 {
        self.paused_at.unwrap_or_else(|| self.clock.position())
    }

    /// Step derived from the clock position
    pub fn clock_step(&self) -> usize {
        self.timing.step_at(self.position())
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            is_playing: self.is_playing(),
            is_paused: self.is_paused(),
            current_step: self.current_step,
            bpm: self.timing.bpm,
            is_looping: self.looping,
        }
    }

    /// Start or resume playback. Ignored while already playing.
    ///
    /// From Stopped, playback starts at the clock position (zero unless the
    /// playhead was cued). From Paused, it resumes at the exact frozen time.
    pub fn play(&mut self, pattern: &DrumPattern) -> bool {
        if self.state.is_playing() {
            debug!("play ignored: already playing");
            return false;
        }

        self.timing = StepTiming::new(self.timing.bpm, pattern.subdivision(), pattern.total_steps());
        let position = self.paused_at.take().unwrap_or_else(|| self.clock.position());
        let boundary_played = std::mem::take(&mut self.boundary_played);
        self.clock.set_position(position);
        self.pending_commits.clear();
        self.schedule_from(position, boundary_played);
        self.clock.start();

        info!(
            position,
            step = self.next_step,
            resumed = self.state.is_paused(),
            "transport playing"
        );
        self.state = TransportState::Playing;
        true
    }

    /// Freeze at the exact current position. Ignored unless playing.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_playing() {
            debug!(state = ?self.state, "pause ignored: not playing");
            return false;
        }

        let position = self.clock.position();
        self.clock.stop();
        self.clear_schedules();
        self.pending_commits.clear();
        self.paused_at = Some(position);
        self.boundary_played = self.played_at(position);
        self.last_tick = None;
        self.current_step = self.timing.step_at(position);
        self.state = TransportState::Paused;

        info!(position, step = self.current_step, "transport paused");
        true
    }

    /// Play when not playing, pause otherwise
    pub fn toggle_play(&mut self, pattern: &DrumPattern) -> bool {
        if self.state.is_playing() {
            self.pause()
        } else {
            self.play(pattern)
        }
    }

    /// Halt and rewind to zero. Always succeeds, including from Stopped.
    pub fn stop(&mut self) {
        self.clock.stop();
        self.clear_schedules();
        self.clock.set_position(0.0);
        self.pending_commits.clear();
        self.paused_at = None;
        self.last_tick = None;
        self.boundary_played = false;
        self.current_step = 0;
        self.next_step = 0;
        if self.state != TransportState::Stopped {
            info!("transport stopped");
        }
        self.state = TransportState::Stopped;
    }

    /// Set the tempo, rounded and clamped to 40..=200. Returns the stored value.
    ///
    /// Callbacks already registered keep their interval; the new step length
    /// applies from the next (re)schedule. While not playing, the cued or
    /// paused position is rescaled so it stays on the same step.
    pub fn set_bpm(&mut self, bpm: f64) -> u16 {
        let bpm = clamp_bpm(bpm);
        if bpm == self.timing.bpm {
            return bpm;
        }

        let old_duration = self.timing.step_duration();
        self.timing.bpm = bpm;
        self.clock.set_bpm(bpm);

        if !self.state.is_playing() {
            let ratio = self.timing.step_duration() / old_duration;
            if let Some(position) = self.paused_at.as_mut() {
                *position *= ratio;
            }
            let cued = self.clock.position() * ratio;
            self.clock.set_position(cued);
        }

        debug!(bpm, "tempo changed");
        bpm
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Pick up a changed bar count or subdivision.
    ///
    /// While playing, the schedule is rebuilt from the exact current position
    /// with the new step length.
    pub fn sync_pattern(&mut self, pattern: &DrumPattern) {
        let timing = StepTiming::new(self.timing.bpm, pattern.subdivision(), pattern.total_steps());
        if timing == self.timing {
            return;
        }
        self.timing = timing;

        if self.state.is_playing() {
            let position = self.clock.position();
            let boundary_played = self.played_at(position);
            self.clear_schedules();
            self.pending_commits.clear();
            self.schedule_from(position, boundary_played);
            self.current_step = self.timing.step_at(position);
        } else {
            self.current_step = self.timing.step_at(self.position());
            self.next_step = self.current_step;
            self.boundary_played = false;
        }
        debug!(total_steps = self.timing.total_steps, "transport grid changed");
    }

    /// Move the playhead one step later, wrapping at the end. Ignored while playing.
    pub fn seek_forward(&mut self) -> bool {
        let target = (self.clock_step() + 1) % self.timing.total_steps;
        self.seek_to(target)
    }

    /// Move the playhead one step earlier, wrapping at the start. Ignored while playing.
    pub fn seek_backward(&mut self) -> bool {
        let total = self.timing.total_steps;
        let target = (self.clock_step() + total - 1) % total;
        self.seek_to(target)
    }

    /// Cue the playhead at `step`, clamped into the pattern. Ignored while playing.
    pub fn set_playhead(&mut self, step: usize) -> bool {
        self.seek_to(step.min(self.timing.total_steps - 1))
    }

    fn seek_to(&mut self, step: usize) -> bool {
        if self.state.is_playing() {
            debug!(step, "seek ignored while playing");
            return false;
        }

        let position = self.timing.time_of_step(step);
        self.clock.set_position(position);
        if self.state.is_paused() {
            self.paused_at = Some(position);
        }
        self.current_step = step;
        self.next_step = step;
        self.boundary_played = false;
        self.pending_commits.clear();
        debug!(step, position, "playhead moved");
        true
    }

    /// Run the clock forward by `dt` seconds, dispatching every callback
    /// that comes due. Returns the number of callbacks delivered.
    pub fn advance<A: AudioTrigger + ?Sized>(
        &mut self,
        dt: f64,
        pattern: &DrumPattern,
        audio: &mut A,
    ) -> usize {
        if !self.clock.is_running() {
            return 0;
        }
        let until = self.clock.position() + dt.max(0.0);
        let mut delivered = 0;
        while let Some(tick) = self.clock.next_due(until) {
            self.on_tick(tick, pattern, audio);
            delivered += 1;
        }
        self.clock.advance_to(until);
        delivered
    }

    /// Handle one callback from the scheduler.
    ///
    /// Ticks from handles that have since been cancelled are dropped.
    pub fn on_tick<A: AudioTrigger + ?Sized>(
        &mut self,
        tick: ClockTick,
        pattern: &DrumPattern,
        audio: &mut A,
    ) {
        if self.stop_id == Some(tick.id) {
            self.stop_id = None;
            debug!(time = tick.time, "end of pattern reached");
            self.stop();
            return;
        }
        if self.repeat_id != Some(tick.id) || !self.state.is_playing() {
            trace!(?tick, "stale tick dropped");
            return;
        }

        let total = pattern.total_steps().max(1);
        let step = self.next_step % total;

        if audio.is_ready() {
            for pad in pattern.active_pads_at(step) {
                audio.trigger(pad, Some(tick.time));
            }
        } else {
            trace!(step, "audio not ready, step skipped");
        }

        // Commits the clock has already passed are superseded by this one
        while self
            .pending_commits
            .back()
            .map_or(false, |commit| commit.time <= tick.time + TIME_EPSILON)
        {
            self.pending_commits.pop_back();
        }
        self.pending_commits.push_back(StepCommit {
            step,
            time: tick.time,
        });
        self.last_tick = Some(tick.time);

        let next = step + 1;
        if next >= total && !self.looping {
            if let Some(id) = self.repeat_id.take() {
                self.clock.cancel(id);
            }
            self.schedule_stop(self.timing.step_duration());
        }
        self.next_step = next % total;
    }

    /// Sample the clock for the render loop, applying every step commit the
    /// clock has reached.
    pub fn render_frame(&mut self) -> PlayheadFrame {
        let position = self.position();
        while let Some(commit) = self.pending_commits.front() {
            if commit.time > position + TIME_EPSILON {
                break;
            }
            self.current_step = commit.step;
            self.pending_commits.pop_front();
        }
        PlayheadFrame {
            current_step: self.current_step,
            clock_step: self.timing.step_at(position),
            position,
            progress: self.timing.step_progress(position),
        }
    }

    /// Register the step schedule starting at `position`.
    ///
    /// `boundary_played` means the step starting at `position` has already
    /// been triggered, so the first tick lands one step later.
    fn schedule_from(&mut self, position: f64, boundary_played: bool) {
        self.clear_schedules();
        let mut offset = self.timing.time_to_next_step(position);
        let mut next = self.timing.next_boundary_step(position);
        if boundary_played && self.timing.is_aligned(position) {
            offset += self.timing.step_duration();
            next += 1;
        }

        if next >= self.timing.total_steps && !self.looping {
            // Paused inside the final step with looping off
            self.next_step = 0;
            self.schedule_stop(offset);
            return;
        }

        self.next_step = next % self.timing.total_steps;
        self.repeat_id = Some(self.clock.schedule_repeating(self.timing.step_duration(), offset));
    }

    /// Whether the last delivered tick was at `position`
    fn played_at(&self, position: f64) -> bool {
        self.last_tick
            .map_or(false, |time| (time - position).abs() < TIME_EPSILON)
    }

    fn schedule_stop(&mut self, delay: f64) {
        if let Some(id) = self.stop_id.take() {
            self.clock.cancel(id);
        }
        self.stop_id = Some(self.clock.schedule_once(delay));
    }

    fn clear_schedules(&mut self) {
        if let Some(id) = self.repeat_id.take() {
            self.clock.cancel(id);
        }
        if let Some(id) = self.stop_id.take() {
            self.clock.cancel(id);
        }
    }
}
