// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The fixed pad layout.
//!
//! Every pattern carries exactly one track per pad, always in this order.
//! The share-link format relies on the order, so pads are only ever
//! appended to the end of the table, never reordered.

use super::finger::FingerDesignation;

/// Number of pads, and therefore tracks per pattern
pub const PAD_COUNT: usize = 18;

/// Static description of one pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSpec {
    /// Stable identifier passed to the audio engine
    pub id: &'static str,
    /// Display label
    pub label: &'static str,
    /// Finger assigned to a step when it is switched on
    pub default_finger: FingerDesignation,
}

/// Canonical pad order
pub const PADS: [PadSpec; PAD_COUNT] = [
    PadSpec { id: "kick", label: "Kick", default_finger: FingerDesignation::left(1) },
    PadSpec { id: "snare", label: "Snare", default_finger: FingerDesignation::right(2) },
    PadSpec { id: "snare-rim", label: "Rim", default_finger: FingerDesignation::right(3) },
    PadSpec { id: "clap", label: "Clap", default_finger: FingerDesignation::right(4) },
    PadSpec { id: "hihat-closed", label: "Closed Hat", default_finger: FingerDesignation::left(2) },
    PadSpec { id: "hihat-open", label: "Open Hat", default_finger: FingerDesignation::left(3) },
    PadSpec { id: "hihat-pedal", label: "Pedal Hat", default_finger: FingerDesignation::left(4) },
    PadSpec { id: "tom-high", label: "High Tom", default_finger: FingerDesignation::right(2) },
    PadSpec { id: "tom-mid", label: "Mid Tom", default_finger: FingerDesignation::right(3) },
    PadSpec { id: "tom-low", label: "Low Tom", default_finger: FingerDesignation::right(4) },
    PadSpec { id: "tom-floor", label: "Floor Tom", default_finger: FingerDesignation::right(5) },
    PadSpec { id: "crash", label: "Crash", default_finger: FingerDesignation::left(2) },
    PadSpec { id: "splash", label: "Splash", default_finger: FingerDesignation::left(3) },
    PadSpec { id: "china", label: "China", default_finger: FingerDesignation::left(5) },
    PadSpec { id: "ride", label: "Ride", default_finger: FingerDesignation::right(2) },
    PadSpec { id: "ride-bell", label: "Ride Bell", default_finger: FingerDesignation::right(3) },
    PadSpec { id: "cowbell", label: "Cowbell", default_finger: FingerDesignation::right(4) },
    PadSpec { id: "tambourine", label: "Tambourine", default_finger: FingerDesignation::left(4) },
];

/// Look up a pad by its identifier
pub fn pad_by_id(id: &str) -> Option<(usize, &'static PadSpec)> {
    PADS.iter().enumerate().find(|(_, pad)| pad.id == id)
}
