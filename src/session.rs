// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editing session: the loaded pattern plus the transport playing it.
//!
//! Every edit and transport call is ignored while no pattern is loaded.
//! Patterns are replaced wholesale on load and dropped wholesale on clear.
//! Each change to the pattern bumps [`Session::revision`], which share-link
//! syncing watches.

use tracing::{debug, info};

use crate::audio::AudioTrigger;
use crate::codec::PatternCodec;
use crate::pattern::{ConversionReport, DrumPattern, FingerDesignation, Subdivision};
use crate::transport::{PlayheadFrame, PreciseScheduler, Transport, TransportClock, TransportSnapshot};

/// The pattern being edited and its playback
#[derive(Debug)]
pub struct Session<A: AudioTrigger, C: PreciseScheduler = TransportClock> {
    pattern: Option<DrumPattern>,
    transport: Transport<C>,
    audio: A,
    codec: PatternCodec,
    revision: u64,
}

impl<A: AudioTrigger> Session<A, TransportClock> {
    /// Session on the stock virtual clock
    pub fn new(audio: A) -> Self {
        Self::with_clock(TransportClock::new(), audio)
    }
}

impl<A: AudioTrigger, C: PreciseScheduler> Session<A, C> {
    pub fn with_clock(clock: C, audio: A) -> Self {
        Self {
            pattern: None,
            transport: Transport::new(clock),
            audio,
            codec: PatternCodec::default(),
            revision: 0,
        }
    }

    /// Use a codec with a different length limit
    pub fn with_codec(mut self, codec: PatternCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn pattern(&self) -> Option<&DrumPattern> {
        self.pattern.as_ref()
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn codec(&self) -> &PatternCodec {
        &self.codec
    }

    /// Counter bumped on every pattern change, including load and clear
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.transport.snapshot()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // --- pattern lifecycle ---

    /// Replace the current pattern, stopping playback
    pub fn load_pattern(&mut self, pattern: DrumPattern) {
        self.transport.stop();
        self.transport.set_bpm(pattern.bpm() as f64);
        self.transport.sync_pattern(&pattern);
        info!(id = pattern.id(), name = pattern.name(), "pattern loaded");
        self.pattern = Some(pattern);
        self.touch();
    }

    /// Load a pattern from a share string. Returns false if it did not decode.
    pub fn load_encoded(&mut self, encoded: &str) -> bool {
        match self.codec.decode(encoded) {
            Some(pattern) => {
                self.load_pattern(pattern);
                true
            }
            None => false,
        }
    }

    /// Load a fresh empty pattern
    pub fn create_pattern(&mut self, name: Option<&str>, bars: u8, subdivision: Subdivision) {
        self.load_pattern(DrumPattern::new(name, bars, subdivision));
    }

    /// Drop the pattern, stopping playback
    pub fn clear_pattern(&mut self) {
        if self.pattern.take().is_some() {
            self.transport.stop();
            self.touch();
            info!("pattern cleared");
        }
    }

    /// Share string for the current pattern
    pub fn encode(&self) -> Option<String> {
        self.pattern.as_ref().and_then(|p| self.codec.encode(p))
    }

    // --- edits ---

    pub fn set_bars(&mut self, bars: u8) -> bool {
        let Some(pattern) = self.pattern.as_mut() else {
            return false;
        };
        if !pattern.set_bars(bars) {
            return false;
        }
        self.transport.sync_pattern(pattern);
        self.touch();
        true
    }

    /// Change subdivision; returns what the conversion kept and dropped
    pub fn set_subdivision(&mut self, subdivision: Subdivision) -> Option<ConversionReport> {
        let pattern = self.pattern.as_mut()?;
        if pattern.subdivision() == subdivision {
            return None;
        }
        let report = pattern.set_subdivision(subdivision);
        if !report.is_lossless() {
            debug!(
                from = %report.from,
                to = %report.to,
                collisions = report.collisions,
                off_grid = report.off_grid,
                "subdivision change dropped steps"
            );
        }
        self.transport.sync_pattern(pattern);
        self.touch();
        Some(report)
    }

    pub fn toggle_step(&mut self, track: usize, step: usize) -> bool {
        self.edit(|pattern| pattern.toggle_step(track, step))
    }

    pub fn update_step_finger(&mut self, track: usize, step: usize, finger: FingerDesignation) -> bool {
        self.edit(|pattern| pattern.update_step_finger(track, step, finger))
    }

    pub fn clear_track(&mut self, track: usize) -> bool {
        self.edit(|pattern| pattern.clear_track(track))
    }

    pub fn clear_all(&mut self) -> bool {
        self.edit(|pattern| {
            pattern.clear_all();
            true
        })
    }

    pub fn rename(&mut self, name: &str) -> bool {
        self.edit(|pattern| {
            pattern.rename(name);
            true
        })
    }

    /// Set tempo on both pattern and transport. Returns the clamped value.
    pub fn set_bpm(&mut self, bpm: f64) -> Option<u16> {
        let pattern = self.pattern.as_mut()?;
        let previous = pattern.bpm();
        let stored = pattern.set_bpm(bpm);
        self.transport.set_bpm(stored as f64);
        if stored != previous {
            self.touch();
        }
        Some(stored)
    }

    fn edit(&mut self, f: impl FnOnce(&mut DrumPattern) -> bool) -> bool {
        let changed = self.pattern.as_mut().map_or(false, f);
        if changed {
            self.touch();
        }
        changed
    }

    // --- transport ---

    pub fn play(&mut self) -> bool {
        match self.pattern.as_ref() {
            Some(pattern) => self.transport.play(pattern),
            None => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        self.pattern.is_some() && self.transport.pause()
    }

    pub fn toggle_play(&mut self) -> bool {
        match self.pattern.as_ref() {
            Some(pattern) => self.transport.toggle_play(pattern),
            None => false,
        }
    }

    pub fn stop(&mut self) -> bool {
        if self.pattern.is_none() {
            return false;
        }
        self.transport.stop();
        true
    }

    pub fn seek_forward(&mut self) -> bool {
        self.pattern.is_some() && self.transport.seek_forward()
    }

    pub fn seek_backward(&mut self) -> bool {
        self.pattern.is_some() && self.transport.seek_backward()
    }

    pub fn set_playhead(&mut self, step: usize) -> bool {
        self.pattern.is_some() && self.transport.set_playhead(step)
    }

    pub fn set_looping(&mut self, looping: bool) -> bool {
        if self.pattern.is_none() {
            return false;
        }
        self.transport.set_looping(looping);
        true
    }

    /// Move the clock forward, triggering due steps on the audio engine
    pub fn advance(&mut self, dt: f64) -> usize {
        match self.pattern.as_ref() {
            Some(pattern) => self.transport.advance(dt, pattern, &mut self.audio),
            None => 0,
        }
    }

    /// Playhead for the render loop
    pub fn render_frame(&mut self) -> PlayheadFrame {
        self.transport.render_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;
    use crate::pattern::Hand;

    fn session() -> Session<RecordingAudio> {
        Session::new(RecordingAudio::new())
    }

    #[test]
    fn test_everything_ignored_without_pattern() {
        let mut session = session();
        let finger = FingerDesignation::new(Hand::Left, 1).unwrap();

        assert!(!session.toggle_step(0, 0));
        assert!(!session.update_step_finger(0, 0, finger));
        assert!(!session.set_bars(2));
        assert!(session.set_subdivision(Subdivision::Eighth).is_none());
        assert!(session.set_bpm(90.0).is_none());
        assert!(!session.rename("x"));
        assert!(!session.clear_all());
        assert!(!session.play());
        assert!(!session.pause());
        assert!(!session.stop());
        assert!(!session.seek_forward());
        assert!(!session.set_playhead(3));
        assert!(!session.set_looping(false));
        assert_eq!(session.advance(1.0), 0);
        assert!(session.encode().is_none());
        assert_eq!(session.revision(), 0);
        assert!(!session.snapshot().is_playing);
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut session = session();
        session.create_pattern(Some("A"), 1, Subdivision::Sixteenth);
        assert_eq!(session.revision(), 1);

        session.toggle_step(0, 0);
        session.set_bpm(100.0);
        assert_eq!(session.revision(), 3);

        // No-op edits leave the revision alone
        session.set_bars(1);
        session.toggle_step(99, 0);
        session.set_subdivision(Subdivision::Sixteenth);
        assert_eq!(session.revision(), 3);

        session.clear_pattern();
        assert_eq!(session.revision(), 4);
        assert!(session.pattern().is_none());
    }

    #[test]
    fn test_unchanged_bpm_keeps_revision() {
        let mut session = session();
        session.create_pattern(None, 1, Subdivision::Sixteenth);
        let revision = session.revision();

        assert_eq!(session.set_bpm(120.2), Some(120));
        assert_eq!(session.set_bpm(500.0), Some(200));
        assert_eq!(session.set_bpm(250.0), Some(200));
        assert_eq!(session.revision(), revision + 1);
    }

    #[test]
    fn test_load_replaces_and_stops() {
        let mut session = session();
        session.create_pattern(None, 1, Subdivision::Sixteenth);
        session.play();
        session.advance(0.3);

        let mut other = DrumPattern::new(Some("B"), 2, Subdivision::Eighth);
        other.set_bpm(90.0);
        session.load_pattern(other);

        let snapshot = session.snapshot();
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.current_step, 0);
        assert_eq!(snapshot.bpm, 90);
        assert_eq!(session.transport().timing().total_steps, 16);
        assert_eq!(session.pattern().unwrap().name(), "B");
    }

    #[test]
    fn test_playback_reads_live_edits() {
        let mut session = session();
        session.create_pattern(None, 1, Subdivision::Sixteenth);
        session.play();
        session.advance(0.0);
        // Enable step 1 while playing; it fires on the next tick
        session.toggle_step(2, 1);
        session.advance(0.125);
        let pads: Vec<&str> = session.audio().hits().iter().map(|h| h.pad_id.as_str()).collect();
        assert_eq!(pads, vec!["snare-rim"]);
    }

    #[test]
    fn test_set_bpm_updates_both() {
        let mut session = session();
        session.create_pattern(None, 1, Subdivision::Sixteenth);
        assert_eq!(session.set_bpm(300.0), Some(200));
        assert_eq!(session.pattern().unwrap().bpm(), 200);
        assert_eq!(session.snapshot().bpm, 200);
    }

    #[test]
    fn test_bars_change_while_playing_resyncs() {
        let mut session = session();
        session.create_pattern(None, 2, Subdivision::Sixteenth);
        session.play();
        session.advance(3.0);
        assert!(session.set_bars(1));
        assert_eq!(session.transport().timing().total_steps, 16);
        assert!(session.snapshot().is_playing);
        assert_eq!(session.transport().clock().scheduled_count(), 1);
    }

    #[test]
    fn test_encoded_round_trip_through_session() {
        let mut session = session();
        session.create_pattern(Some("Share"), 1, Subdivision::EighthTriplet);
        session.toggle_step(5, 7);
        let encoded = session.encode().unwrap();

        let mut other = Session::new(RecordingAudio::new());
        assert!(other.load_encoded(&encoded));
        assert_eq!(other.pattern().unwrap().tracks(), session.pattern().unwrap().tracks());
        assert!(!other.load_encoded("garbage!"));
        assert_eq!(other.revision(), 1);
    }

    #[test]
    fn test_subdivision_report() {
        let mut session = session();
        session.create_pattern(None, 1, Subdivision::Sixteenth);
        session.toggle_step(0, 1);
        session.toggle_step(0, 2);
        session.toggle_step(0, 3);
        let report = session.set_subdivision(Subdivision::EighthTriplet).unwrap();
        assert_eq!(report.collisions, 1);
        assert_eq!(session.transport().timing().total_steps, 12);
    }
}
