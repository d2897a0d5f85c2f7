// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pattern data model and structural edits.
//!
//! A [`DrumPattern`] always holds one track per pad, and every track holds
//! exactly `bars * steps_per_bar` steps. All edits keep that invariant; edits
//! that address a track or step outside the grid do nothing and return false.

use std::fmt::Write as _;

use super::finger::FingerDesignation;
use super::pads::{PadSpec, PADS};
use super::subdivision::Subdivision;
use super::{DEFAULT_BPM, DEFAULT_NAME, MAX_BARS, MAX_BPM, MAX_NAME_BYTES, MIN_BPM};

/// One cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatternStep {
    active: bool,
    velocity: Option<f32>,
    finger: Option<FingerDesignation>,
}

impl PatternStep {
    /// An active step played with the given finger
    pub fn active(finger: FingerDesignation) -> Self {
        Self {
            active: true,
            velocity: None,
            finger: Some(finger),
        }
    }

    /// Attach a velocity (stored, not interpreted by playback)
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity.clamp(0.0, 1.0));
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn velocity(&self) -> Option<f32> {
        self.velocity
    }

    /// Finger for this hit; always `Some` for active steps and `None` otherwise
    pub fn finger(&self) -> Option<FingerDesignation> {
        self.finger
    }
}

/// The steps of a single pad
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTrack {
    pad_id: String,
    label: String,
    default_finger: FingerDesignation,
    steps: Vec<PatternStep>,
}

impl PatternTrack {
    fn empty(pad: &PadSpec, length: usize) -> Self {
        Self {
            pad_id: pad.id.to_string(),
            label: pad.label.to_string(),
            default_finger: pad.default_finger,
            steps: vec![PatternStep::default(); length],
        }
    }

    pub fn pad_id(&self) -> &str {
        &self.pad_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn default_finger(&self) -> FingerDesignation {
        self.default_finger
    }

    pub fn steps(&self) -> &[PatternStep] {
        &self.steps
    }

    /// Whether the step at `index` is active; false when out of range
    pub fn is_active(&self, index: usize) -> bool {
        self.steps.get(index).map_or(false, |step| step.active)
    }

    /// Number of active steps
    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|step| step.active).count()
    }
}

/// Outcome of a subdivision change.
///
/// Converting between grids whose step counts are not whole multiples of
/// each other is lossy: hits are moved to the nearest new step, and when
/// several land on the same step the first one processed (lowest track,
/// then lowest old index) wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub from: Subdivision,
    pub to: Subdivision,
    /// Active steps carried into the new grid
    pub kept: usize,
    /// Active steps dropped because an earlier step already took their slot
    pub collisions: usize,
    /// Active steps dropped because they fall between the new grid lines
    pub off_grid: usize,
}

impl ConversionReport {
    /// Total active steps lost in the conversion
    pub fn dropped(&self) -> usize {
        self.collisions + self.off_grid
    }

    pub fn is_lossless(&self) -> bool {
        self.dropped() == 0
    }
}

/// How old step indices map onto a new subdivision
#[derive(Debug, Clone, Copy, PartialEq)]
enum IndexMapping {
    /// New grid is finer by a whole factor
    Multiply(usize),
    /// New grid is coarser by a whole factor
    Divide(usize),
    /// No whole-number relation; map by beat position
    Rescale { old_per_beat: f64, new_per_beat: f64 },
}

impl IndexMapping {
    fn between(from: Subdivision, to: Subdivision) -> Self {
        let old = from.steps_per_bar();
        let new = to.steps_per_bar();
        if new % old == 0 {
            IndexMapping::Multiply(new / old)
        } else if old % new == 0 {
            IndexMapping::Divide(old / new)
        } else {
            IndexMapping::Rescale {
                old_per_beat: from.steps_per_beat(),
                new_per_beat: to.steps_per_beat(),
            }
        }
    }

    fn map(self, index: usize) -> Option<usize> {
        match self {
            IndexMapping::Multiply(factor) => Some(index * factor),
            IndexMapping::Divide(factor) => (index % factor == 0).then(|| index / factor),
            IndexMapping::Rescale {
                old_per_beat,
                new_per_beat,
            } => {
                let beat_position = index as f64 / old_per_beat;
                Some((beat_position * new_per_beat).round() as usize)
            }
        }
    }
}

/// A complete multi-track step pattern
#[derive(Debug, Clone, PartialEq)]
pub struct DrumPattern {
    id: String,
    name: String,
    bpm: u16,
    subdivision: Subdivision,
    bars: u8,
    tracks: Vec<PatternTrack>,
}

impl DrumPattern {
    /// Create an all-inactive pattern with one track per pad.
    ///
    /// `bars` is clamped to 1..=4 and the name falls back to "Untitled".
    pub fn new(name: Option<&str>, bars: u8, subdivision: Subdivision) -> Self {
        let bars = clamp_bars(bars);
        let length = subdivision.total_steps(bars);
        Self {
            id: mint_id("pattern"),
            name: truncate_name(name.unwrap_or(DEFAULT_NAME)),
            bpm: DEFAULT_BPM,
            subdivision,
            bars,
            tracks: PADS.iter().map(|pad| PatternTrack::empty(pad, length)).collect(),
        }
    }

    /// Same as `new`, with a fresh id minted from `prefix`
    pub(crate) fn with_id_prefix(prefix: &str, name: &str, bars: u8, subdivision: Subdivision) -> Self {
        Self {
            id: mint_id(prefix),
            ..Self::new(Some(name), bars, subdivision)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn bars(&self) -> u8 {
        self.bars
    }

    pub fn tracks(&self) -> &[PatternTrack] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&PatternTrack> {
        self.tracks.get(index)
    }

    /// Steps per track
    pub fn total_steps(&self) -> usize {
        self.subdivision.total_steps(self.bars)
    }

    /// Step at `(track, step)`, if both are in range
    pub fn step_at(&self, track: usize, step: usize) -> Option<&PatternStep> {
        self.tracks.get(track).and_then(|t| t.steps.get(step))
    }

    /// Total active steps across all tracks
    pub fn active_step_count(&self) -> usize {
        self.tracks.iter().map(PatternTrack::active_count).sum()
    }

    /// Pad ids with an active step at `index`, in track order
    pub fn active_pads_at(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.tracks
            .iter()
            .filter(move |track| track.is_active(index))
            .map(|track| track.pad_id.as_str())
    }

    /// Rename, truncating to 255 bytes at a character boundary
    pub fn rename(&mut self, name: &str) {
        self.name = truncate_name(name);
    }

    /// Set tempo, rounded and clamped to 40..=200. Returns the stored value.
    pub fn set_bpm(&mut self, bpm: f64) -> u16 {
        self.bpm = clamp_bpm(bpm);
        self.bpm
    }

    /// Change the number of bars.
    ///
    /// Steps below the shorter of the two lengths are kept as they are.
    /// Growing appends inactive steps; shrinking discards the tail.
    pub fn set_bars(&mut self, bars: u8) -> bool {
        let bars = clamp_bars(bars);
        if bars == self.bars {
            return false;
        }
        let length = self.subdivision.total_steps(bars);
        for track in &mut self.tracks {
            track.steps.resize(length, PatternStep::default());
        }
        self.bars = bars;
        true
    }

    /// Change the subdivision, moving active steps onto the new grid
    pub fn set_subdivision(&mut self, subdivision: Subdivision) -> ConversionReport {
        let mut report = ConversionReport {
            from: self.subdivision,
            to: subdivision,
            kept: 0,
            collisions: 0,
            off_grid: 0,
        };
        if subdivision == self.subdivision {
            report.kept = self.active_step_count();
            return report;
        }

        let mapping = IndexMapping::between(self.subdivision, subdivision);
        let length = subdivision.total_steps(self.bars);

        for track in &mut self.tracks {
            let mut steps = vec![PatternStep::default(); length];
            for (old_index, step) in track.steps.iter().enumerate() {
                if !step.active {
                    continue;
                }
                match mapping.map(old_index) {
                    Some(new_index) if new_index < length => {
                        if steps[new_index].active {
                            report.collisions += 1;
                        } else {
                            steps[new_index] = *step;
                            report.kept += 1;
                        }
                    }
                    _ => report.off_grid += 1,
                }
            }
            track.steps = steps;
        }

        self.subdivision = subdivision;
        report
    }

    /// Flip a step. Activation copies the track's default finger into the step.
    pub fn toggle_step(&mut self, track: usize, step: usize) -> bool {
        let Some(track) = self.tracks.get_mut(track) else {
            return false;
        };
        let default_finger = track.default_finger;
        let Some(cell) = track.steps.get_mut(step) else {
            return false;
        };
        *cell = if cell.active {
            PatternStep {
                active: false,
                velocity: cell.velocity,
                finger: None,
            }
        } else {
            PatternStep {
                active: true,
                velocity: cell.velocity,
                finger: Some(default_finger),
            }
        };
        true
    }

    /// Reassign the finger of an active step; inactive steps are left alone
    pub fn update_step_finger(&mut self, track: usize, step: usize, finger: FingerDesignation) -> bool {
        match self.tracks.get_mut(track).and_then(|t| t.steps.get_mut(step)) {
            Some(cell) if cell.active => {
                cell.finger = Some(finger);
                true
            }
            _ => false,
        }
    }

    /// Deactivate every step of one track
    pub fn clear_track(&mut self, track: usize) -> bool {
        let Some(track) = self.tracks.get_mut(track) else {
            return false;
        };
        let length = track.steps.len();
        track.steps = vec![PatternStep::default(); length];
        true
    }

    /// Deactivate every step of every track
    pub fn clear_all(&mut self) {
        for index in 0..self.tracks.len() {
            self.clear_track(index);
        }
    }

    /// Overwrite a step wholesale, used when rebuilding from a share link
    pub(crate) fn set_step(&mut self, track: usize, step: usize, value: PatternStep) -> bool {
        match self.tracks.get_mut(track).and_then(|t| t.steps.get_mut(step)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Render the grid as text, one line per track.
    ///
    /// Active steps show the hand letter of their finger, beats are separated
    /// by `|` when a beat spans a whole number of steps.
    pub fn to_grid_string(&self) -> String {
        let per_beat = self.subdivision.steps_per_beat();
        let group = if per_beat.fract() == 0.0 {
            per_beat as usize
        } else {
            self.subdivision.steps_per_bar()
        };
        let label_width = self.tracks.iter().map(|t| t.label.len()).max().unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} - {} BPM, {} bar(s), {}",
            self.name, self.bpm, self.bars, self.subdivision
        );
        for track in &self.tracks {
            let _ = write!(out, "{:<width$} |", track.label, width = label_width);
            for (index, step) in track.steps.iter().enumerate() {
                let cell = match step.finger {
                    Some(finger) if step.active => finger.hand().letter(),
                    _ => '.',
                };
                out.push(cell);
                if (index + 1) % group == 0 {
                    out.push('|');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Default for DrumPattern {
    fn default() -> Self {
        Self::new(None, 1, Subdivision::default())
    }
}

/// Round and clamp a tempo to the supported range
pub fn clamp_bpm(bpm: f64) -> u16 {
    if bpm.is_nan() {
        return DEFAULT_BPM;
    }
    bpm.round().clamp(MIN_BPM as f64, MAX_BPM as f64) as u16
}

/// Clamp a bar count to 1..=4
pub fn clamp_bars(bars: u8) -> u8 {
    bars.clamp(1, MAX_BARS)
}

/// Cut a name to at most 255 UTF-8 bytes without splitting a character
pub fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name.to_string();
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

fn mint_id(prefix: &str) -> String {
    format!("{}-{:012x}", prefix, rand::random::<u64>() & 0xffff_ffff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Hand, PAD_COUNT};

    fn finger(hand: Hand, n: u8) -> FingerDesignation {
        FingerDesignation::new(hand, n).unwrap()
    }

    fn active_indices(pattern: &DrumPattern, track: usize) -> Vec<usize> {
        pattern.tracks()[track]
            .steps()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_new_pattern_shape() {
        let pattern = DrumPattern::new(None, 2, Subdivision::Eighth);
        assert_eq!(pattern.name(), "Untitled");
        assert_eq!(pattern.bpm(), 120);
        assert_eq!(pattern.tracks().len(), PAD_COUNT);
        for (track, pad) in pattern.tracks().iter().zip(PADS.iter()) {
            assert_eq!(track.pad_id(), pad.id);
            assert_eq!(track.default_finger(), pad.default_finger);
            assert_eq!(track.steps().len(), 16);
            assert_eq!(track.active_count(), 0);
        }
    }

    #[test]
    fn test_bars_clamped() {
        assert_eq!(DrumPattern::new(None, 0, Subdivision::Sixteenth).bars(), 1);
        assert_eq!(DrumPattern::new(None, 9, Subdivision::Sixteenth).bars(), 4);
    }

    #[test]
    fn test_ids_are_fresh() {
        let a = DrumPattern::default();
        let b = DrumPattern::default();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("pattern-"));
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut pattern = DrumPattern::default();
        assert!(pattern.toggle_step(1, 4));
        let step = pattern.step_at(1, 4).unwrap();
        assert!(step.is_active());
        assert_eq!(step.finger(), Some(PADS[1].default_finger));

        assert!(pattern.toggle_step(1, 4));
        let step = pattern.step_at(1, 4).unwrap();
        assert!(!step.is_active());
        assert_eq!(step.finger(), None);
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut pattern = DrumPattern::default();
        assert!(!pattern.toggle_step(PAD_COUNT, 0));
        assert!(!pattern.toggle_step(0, 16));
        assert_eq!(pattern.active_step_count(), 0);
    }

    #[test]
    fn test_default_finger_is_copied() {
        let mut pattern = DrumPattern::default();
        pattern.toggle_step(0, 0);
        pattern.update_step_finger(0, 0, finger(Hand::Right, 5));
        assert_eq!(pattern.tracks()[0].default_finger(), PADS[0].default_finger);
        pattern.toggle_step(0, 1);
        assert_eq!(pattern.step_at(0, 1).unwrap().finger(), Some(PADS[0].default_finger));
    }

    #[test]
    fn test_update_finger_inactive_is_noop() {
        let mut pattern = DrumPattern::default();
        let before = pattern.clone();
        assert!(!pattern.update_step_finger(3, 3, finger(Hand::Left, 4)));
        assert_eq!(pattern, before);
    }

    #[test]
    fn test_update_finger_active() {
        let mut pattern = DrumPattern::default();
        pattern.toggle_step(3, 3);
        assert!(pattern.update_step_finger(3, 3, finger(Hand::Left, 4)));
        assert_eq!(pattern.step_at(3, 3).unwrap().finger(), Some(finger(Hand::Left, 4)));
    }

    #[test]
    fn test_set_bars_grow_then_shrink() {
        let mut pattern = DrumPattern::default();
        pattern.toggle_step(0, 0);
        pattern.toggle_step(4, 15);
        pattern.update_step_finger(4, 15, finger(Hand::Right, 1));
        let original = pattern.clone();

        assert!(pattern.set_bars(3));
        assert_eq!(pattern.total_steps(), 48);
        assert!(pattern.tracks().iter().all(|t| t.steps().len() == 48));
        assert!(!pattern.step_at(0, 47).unwrap().is_active());

        assert!(pattern.set_bars(1));
        assert_eq!(pattern, original);
    }

    #[test]
    fn test_set_bars_shrink_truncates() {
        let mut pattern = DrumPattern::new(None, 2, Subdivision::Sixteenth);
        pattern.toggle_step(0, 20);
        pattern.set_bars(1);
        pattern.set_bars(2);
        assert!(!pattern.step_at(0, 20).unwrap().is_active());
    }

    #[test]
    fn test_set_bars_same_is_noop() {
        let mut pattern = DrumPattern::default();
        assert!(!pattern.set_bars(1));
    }

    #[test]
    fn test_clean_ratio_round_trip() {
        let mut pattern = DrumPattern::new(None, 1, Subdivision::Eighth);
        for index in [0, 3, 5, 7] {
            pattern.toggle_step(2, index);
        }
        pattern.update_step_finger(2, 5, finger(Hand::Left, 5));
        let original = pattern.clone();

        let report = pattern.set_subdivision(Subdivision::Sixteenth);
        assert!(report.is_lossless());
        assert_eq!(active_indices(&pattern, 2), vec![0, 6, 10, 14]);
        assert_eq!(pattern.step_at(2, 10).unwrap().finger(), Some(finger(Hand::Left, 5)));

        let report = pattern.set_subdivision(Subdivision::Eighth);
        assert!(report.is_lossless());
        assert_eq!(pattern, original);
    }

    #[test]
    fn test_combining_drops_off_grid_steps() {
        let mut pattern = DrumPattern::new(None, 1, Subdivision::Sixteenth);
        pattern.toggle_step(0, 0);
        pattern.toggle_step(0, 1);
        pattern.toggle_step(0, 4);

        let report = pattern.set_subdivision(Subdivision::Quarter);
        assert_eq!(active_indices(&pattern, 0), vec![0, 1]);
        assert_eq!(report.kept, 2);
        assert_eq!(report.off_grid, 1);
        assert_eq!(report.collisions, 0);
    }

    #[test]
    fn test_triplet_conversion_first_writer_wins() {
        // Sixteenth (4/beat) to eighth triplet (3/beat): old 1 -> round(0.75) = 1,
        // old 2 -> round(1.5) = 2, old 3 -> round(2.25) = 2 collides.
        let mut pattern = DrumPattern::new(None, 1, Subdivision::Sixteenth);
        pattern.toggle_step(0, 1);
        pattern.toggle_step(0, 2);
        pattern.update_step_finger(0, 2, finger(Hand::Right, 4));
        pattern.toggle_step(0, 3);

        let report = pattern.set_subdivision(Subdivision::EighthTriplet);
        assert_eq!(pattern.total_steps(), 12);
        assert_eq!(active_indices(&pattern, 0), vec![1, 2]);
        assert_eq!(pattern.step_at(0, 2).unwrap().finger(), Some(finger(Hand::Right, 4)));
        assert_eq!(report.kept, 2);
        assert_eq!(report.collisions, 1);
        assert!(!report.is_lossless());
    }

    #[test]
    fn test_triplet_conversion_never_overflows() {
        let mut pattern = DrumPattern::new(None, 4, Subdivision::ThirtySecond);
        for index in 0..pattern.total_steps() {
            pattern.toggle_step(0, index);
        }
        for target in Subdivision::ALL {
            let report = pattern.set_subdivision(target);
            assert!(pattern.tracks().iter().all(|t| t.steps().len() == pattern.total_steps()));
            assert_eq!(report.kept, pattern.active_step_count());
        }
    }

    #[test]
    fn test_set_bpm_clamps_and_rounds() {
        let mut pattern = DrumPattern::default();
        assert_eq!(pattern.set_bpm(12.0), 40);
        assert_eq!(pattern.set_bpm(999.0), 200);
        assert_eq!(pattern.set_bpm(99.6), 100);
        assert_eq!(clamp_bpm(f64::NAN), 120);
    }

    #[test]
    fn test_rename_truncates_on_char_boundary() {
        let mut pattern = DrumPattern::default();
        let long = "é".repeat(200); // 400 bytes
        pattern.rename(&long);
        assert_eq!(pattern.name().len(), 254);
        assert!(pattern.name().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_clear_all() {
        let mut pattern = DrumPattern::default();
        pattern.toggle_step(0, 0);
        pattern.toggle_step(17, 15);
        pattern.clear_all();
        assert_eq!(pattern.active_step_count(), 0);
        assert_eq!(pattern.total_steps(), 16);
    }

    #[test]
    fn test_active_pads_at() {
        let mut pattern = DrumPattern::default();
        pattern.toggle_step(0, 4);
        pattern.toggle_step(4, 4);
        let pads: Vec<_> = pattern.active_pads_at(4).collect();
        assert_eq!(pads, vec!["kick", "hihat-closed"]);
    }

    #[test]
    fn test_grid_string() {
        let mut pattern = DrumPattern::new(Some("Beat"), 1, Subdivision::Quarter);
        pattern.toggle_step(0, 0);
        let grid = pattern.to_grid_string();
        assert!(grid.starts_with("Beat - 120 BPM, 1 bar(s), quarter"));
        assert!(grid.contains("Kick       |L|.|.|.|"));
    }
}
