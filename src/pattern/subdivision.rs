// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note-length subdivisions of the beat.
//!
//! A subdivision fixes how many grid steps fit in one beat. Straight values
//! double at each level; triplet values fit three steps where two straight
//! steps of the next-longer value would go.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Beats per bar (fixed 4/4 meter)
pub const BEATS_PER_BAR: usize = 4;

/// Grid subdivision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subdivision {
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    QuarterTriplet,
    EighthTriplet,
    SixteenthTriplet,
    ThirtySecondTriplet,
}

impl Default for Subdivision {
    fn default() -> Self {
        Subdivision::Sixteenth
    }
}

impl Subdivision {
    /// All subdivisions in wire-code order
    pub const ALL: [Subdivision; 8] = [
        Subdivision::Quarter,
        Subdivision::Eighth,
        Subdivision::Sixteenth,
        Subdivision::ThirtySecond,
        Subdivision::QuarterTriplet,
        Subdivision::EighthTriplet,
        Subdivision::SixteenthTriplet,
        Subdivision::ThirtySecondTriplet,
    ];

    /// Steps in one beat (1.5 for quarter triplets)
    pub fn steps_per_beat(self) -> f64 {
        self.steps_per_bar() as f64 / BEATS_PER_BAR as f64
    }

    /// Steps in one bar; always a whole number
    pub fn steps_per_bar(self) -> usize {
        match self {
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 8,
            Subdivision::Sixteenth => 16,
            Subdivision::ThirtySecond => 32,
            Subdivision::QuarterTriplet => 6,
            Subdivision::EighthTriplet => 12,
            Subdivision::SixteenthTriplet => 24,
            Subdivision::ThirtySecondTriplet => 48,
        }
    }

    /// Total grid length for a number of bars
    pub fn total_steps(self, bars: u8) -> usize {
        bars as usize * self.steps_per_bar()
    }

    /// Duration of one step in seconds at the given tempo
    pub fn step_duration(self, bpm: f64) -> f64 {
        60.0 / bpm / self.steps_per_beat()
    }

    pub fn is_triplet(self) -> bool {
        matches!(
            self,
            Subdivision::QuarterTriplet
                | Subdivision::EighthTriplet
                | Subdivision::SixteenthTriplet
                | Subdivision::ThirtySecondTriplet
        )
    }

    /// Numeric code used by the share-link format
    pub fn code(self) -> u8 {
        match self {
            Subdivision::Quarter => 0,
            Subdivision::Eighth => 1,
            Subdivision::Sixteenth => 2,
            Subdivision::ThirtySecond => 3,
            Subdivision::QuarterTriplet => 4,
            Subdivision::EighthTriplet => 5,
            Subdivision::SixteenthTriplet => 6,
            Subdivision::ThirtySecondTriplet => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Kebab-case name, as accepted by config files and the CLI
    pub fn name(self) -> &'static str {
        match self {
            Subdivision::Quarter => "quarter",
            Subdivision::Eighth => "eighth",
            Subdivision::Sixteenth => "sixteenth",
            Subdivision::ThirtySecond => "thirty-second",
            Subdivision::QuarterTriplet => "quarter-triplet",
            Subdivision::EighthTriplet => "eighth-triplet",
            Subdivision::SixteenthTriplet => "sixteenth-triplet",
            Subdivision::ThirtySecondTriplet => "thirty-second-triplet",
        }
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subdivision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Some(sub) = Self::ALL.iter().copied().find(|sub| sub.name() == lowered) {
            return Ok(sub);
        }

        // Short note-value aliases
        match lowered.as_str() {
            "4n" | "4" => Ok(Subdivision::Quarter),
            "8n" | "8" => Ok(Subdivision::Eighth),
            "16n" | "16" => Ok(Subdivision::Sixteenth),
            "32n" | "32" => Ok(Subdivision::ThirtySecond),
            "4t" => Ok(Subdivision::QuarterTriplet),
            "8t" => Ok(Subdivision::EighthTriplet),
            "16t" => Ok(Subdivision::SixteenthTriplet),
            "32t" => Ok(Subdivision::ThirtySecondTriplet),
            _ => Err(format!("Unknown subdivision: {}", s)),
        }
    }
}
