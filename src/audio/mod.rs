// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio trigger contract.
//!
//! The sound engine itself lives outside this crate. The transport only
//! needs to fire a pad at an exact clock time, and to know whether the
//! engine is ready to make sound. Triggers are polyphonic: several pads
//! firing on the same step are independent.

use tracing::info;

/// Trait for sound engines driven by the transport.
pub trait AudioTrigger {
    /// Fire a pad.
    ///
    /// # Arguments
    /// * `pad_id` - Pad identifier from the pad table
    /// * `time` - Exact clock time in seconds, or None for "now"
    fn trigger(&mut self, pad_id: &str, time: Option<f64>);

    /// Whether the engine can make sound yet (samples loaded, device open)
    fn is_ready(&self) -> bool {
        true
    }
}

/// Engine that writes every trigger to the log
#[derive(Debug, Default)]
pub struct LogAudio {
    triggered: u64,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triggers so far
    pub fn triggered(&self) -> u64 {
        self.triggered
    }
}

impl AudioTrigger for LogAudio {
    fn trigger(&mut self, pad_id: &str, time: Option<f64>) {
        self.triggered += 1;
        match time {
            Some(time) => info!(pad = pad_id, time = (time * 1000.0).round() / 1000.0, "hit"),
            None => info!(pad = pad_id, "hit"),
        }
    }
}

/// A trigger captured by [`RecordingAudio`]
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredHit {
    pub pad_id: String,
    pub time: Option<f64>,
}

/// Engine that records triggers instead of playing them
#[derive(Debug, Clone)]
pub struct RecordingAudio {
    hits: Vec<TriggeredHit>,
    ready: bool,
}

impl Default for RecordingAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            ready: true,
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn hits(&self) -> &[TriggeredHit] {
        &self.hits
    }

    /// Forget recorded hits
    pub fn clear(&mut self) {
        self.hits.clear();
    }
}

impl AudioTrigger for RecordingAudio {
    fn trigger(&mut self, pad_id: &str, time: Option<f64>) {
        self.hits.push(TriggeredHit {
            pad_id: pad_id.to_string(),
            time,
        });
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_audio() {
        let mut audio = RecordingAudio::new();
        assert!(audio.is_ready());
        audio.trigger("kick", Some(0.5));
        audio.trigger("snare", None);
        assert_eq!(audio.hits().len(), 2);
        assert_eq!(audio.hits()[0].pad_id, "kick");
        assert_eq!(audio.hits()[1].time, None);

        audio.clear();
        assert!(audio.hits().is_empty());
    }

    #[test]
    fn test_log_audio_counts() {
        let mut audio = LogAudio::new();
        audio.trigger("ride", Some(1.0));
        audio.trigger("ride", None);
        assert_eq!(audio.triggered(), 2);
        assert!(audio.is_ready());
    }

    #[test]
    fn test_trait_object() {
        let mut audio: Box<dyn AudioTrigger> = Box::new(RecordingAudio::new());
        audio.trigger("clap", Some(0.0));
        assert!(audio.is_ready());
    }
}
