// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pattern data model.
//!
//! This module provides:
//! - Finger designations for practice guidance
//! - Subdivisions (straight and triplet) and their step math
//! - The fixed 18-pad layout
//! - The pattern grid and its structural edits

pub mod finger;
pub mod model;
pub mod pads;
pub mod subdivision;

pub use finger::{FingerDesignation, Hand};
pub use model::{
    clamp_bars, clamp_bpm, truncate_name, ConversionReport, DrumPattern, PatternStep, PatternTrack,
};
pub use pads::{pad_by_id, PadSpec, PADS, PAD_COUNT};
pub use subdivision::{Subdivision, BEATS_PER_BAR};

/// Slowest supported tempo
pub const MIN_BPM: u16 = 40;
/// Fastest supported tempo
pub const MAX_BPM: u16 = 200;
/// Tempo of a fresh pattern
pub const DEFAULT_BPM: u16 = 120;
/// Longest supported pattern
pub const MAX_BARS: u8 = 4;
/// Longest pattern name in UTF-8 bytes
pub const MAX_NAME_BYTES: usize = 255;
/// Name of a fresh pattern
pub const DEFAULT_NAME: &str = "Untitled";
