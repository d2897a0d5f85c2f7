// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Binary pattern layout.
//!
//! ```text
//! u8      format version
//! u8      flags: bars-1 in bits 7-6, subdivision code below it
//! u16     bpm, big-endian
//! u8      name length, then that many UTF-8 bytes
//! [u8]    per track: ceil(steps/8) bytes of activity bits, MSB first
//! [u8]    per active step: 4-bit finger field, two per byte, high nibble first
//! ```
//!
//! Version 1 stores the subdivision in bits 5-4 and therefore only knows the
//! four straight subdivisions. Version 2 uses bits 5-3 so triplets fit too.

use crate::pattern::{
    truncate_name, DrumPattern, FingerDesignation, PatternStep, Subdivision, MAX_NAME_BYTES,
    PAD_COUNT,
};

use super::CodecError;

/// Version written by the encoder
pub const FORMAT_VERSION: u8 = 2;
/// Oldest version still accepted by the decoder
pub const LEGACY_FORMAT_VERSION: u8 = 1;

const BARS_SHIFT: u8 = 6;
const LEGACY_SUBDIVISION_SHIFT: u8 = 4;
const LEGACY_SUBDIVISION_MASK: u8 = 0b11;
const SUBDIVISION_SHIFT: u8 = 3;
const SUBDIVISION_MASK: u8 = 0b111;

/// Serialize a pattern into the current format version
pub fn write_pattern(pattern: &DrumPattern) -> Vec<u8> {
    let total_steps = pattern.total_steps();
    let bitmap_len = bitmap_len(total_steps);

    let name = pattern.name().as_bytes();
    let name = &name[..name.len().min(MAX_NAME_BYTES)];

    let mut out = Vec::with_capacity(5 + name.len() + PAD_COUNT * bitmap_len);
    out.push(FORMAT_VERSION);
    out.push(((pattern.bars() - 1) << BARS_SHIFT) | (pattern.subdivision().code() << SUBDIVISION_SHIFT));
    out.extend_from_slice(&pattern.bpm().to_be_bytes());
    out.push(name.len() as u8);
    out.extend_from_slice(name);

    let mut fingers = NibbleWriter::default();
    for track in pattern.tracks() {
        let mut bitmap = vec![0u8; bitmap_len];
        for (index, step) in track.steps().iter().enumerate() {
            if !step.is_active() {
                continue;
            }
            bitmap[index / 8] |= 0x80 >> (index % 8);
            let finger = step.finger().unwrap_or_else(|| track.default_finger());
            fingers.push(finger.to_nibble());
        }
        out.extend_from_slice(&bitmap);
    }
    out.extend_from_slice(&fingers.finish());
    out
}

/// Rebuild a pattern from any supported format version.
///
/// The result always has a freshly minted id.
pub fn read_pattern(bytes: &[u8]) -> Result<DrumPattern, CodecError> {
    let mut reader = ByteReader::new(bytes);

    let version = reader.u8()?;
    let flags = reader.u8()?;
    let subdivision_code = match version {
        LEGACY_FORMAT_VERSION => (flags >> LEGACY_SUBDIVISION_SHIFT) & LEGACY_SUBDIVISION_MASK,
        FORMAT_VERSION => (flags >> SUBDIVISION_SHIFT) & SUBDIVISION_MASK,
        other => return Err(CodecError::UnsupportedVersion(other)),
    };
    let subdivision =
        Subdivision::from_code(subdivision_code).ok_or(CodecError::UnsupportedVersion(version))?;
    let bars = (flags >> BARS_SHIFT) + 1;

    let bpm = u16::from_be_bytes([reader.u8()?, reader.u8()?]);
    let name_len = reader.u8()? as usize;
    let name = String::from_utf8_lossy(reader.take(name_len)?);

    let mut pattern = DrumPattern::with_id_prefix("shared", &truncate_name(&name), bars, subdivision);
    pattern.set_bpm(bpm as f64);

    let total_steps = pattern.total_steps();
    let bitmap_len = bitmap_len(total_steps);
    let mut active = Vec::new();
    for track in 0..PAD_COUNT {
        let bitmap = reader.take(bitmap_len)?;
        for index in 0..total_steps {
            if bitmap[index / 8] & (0x80 >> (index % 8)) != 0 {
                active.push((track, index));
            }
        }
    }

    let fingers = reader.take(active.len().div_ceil(2))?;
    for (n, (track, index)) in active.into_iter().enumerate() {
        let byte = fingers[n / 2];
        let nibble = if n % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        let finger = FingerDesignation::from_nibble(nibble).ok_or(CodecError::InvalidFinger(nibble))?;
        pattern.set_step(track, index, PatternStep::active(finger));
    }

    Ok(pattern)
}

fn bitmap_len(total_steps: usize) -> usize {
    total_steps.div_ceil(8)
}

/// Packs 4-bit fields two to a byte
#[derive(Debug, Default)]
struct NibbleWriter {
    bytes: Vec<u8>,
    half: bool,
}

impl NibbleWriter {
    fn push(&mut self, nibble: u8) {
        if self.half {
            if let Some(last) = self.bytes.last_mut() {
                *last |= nibble & 0x0f;
            }
        } else {
            self.bytes.push((nibble & 0x0f) << 4);
        }
        self.half = !self.half;
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Bounds-checked cursor over the decoded buffer
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.offset + len;
        if end > self.bytes.len() {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: end - self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Hand;

    #[test]
    fn test_header_layout() {
        let mut pattern = DrumPattern::new(Some("Test"), 2, Subdivision::EighthTriplet);
        pattern.set_bpm(130.0);
        let bytes = write_pattern(&pattern);

        assert_eq!(bytes[0], FORMAT_VERSION);
        assert_eq!(bytes[1], (1 << 6) | (5 << 3));
        assert_eq!(&bytes[2..4], &[0, 130]);
        assert_eq!(bytes[4], 4);
        assert_eq!(&bytes[5..9], b"Test");
        // 24 steps -> 3 bitmap bytes per track, no fingers
        assert_eq!(bytes.len(), 9 + PAD_COUNT * 3);
    }

    #[test]
    fn test_bitmap_and_finger_packing() {
        let mut pattern = DrumPattern::new(Some(""), 1, Subdivision::Sixteenth);
        pattern.toggle_step(0, 0);
        pattern.update_step_finger(0, 0, FingerDesignation::new(Hand::Right, 2).unwrap());
        pattern.toggle_step(0, 9);
        pattern.update_step_finger(0, 9, FingerDesignation::new(Hand::Left, 5).unwrap());
        pattern.toggle_step(1, 15);
        pattern.update_step_finger(1, 15, FingerDesignation::new(Hand::Right, 1).unwrap());

        let bytes = write_pattern(&pattern);
        let body = &bytes[5..];
        assert_eq!(&body[0..2], &[0b1000_0000, 0b0100_0000]);
        assert_eq!(&body[2..4], &[0b0000_0000, 0b0000_0001]);

        let fingers = &body[PAD_COUNT * 2..];
        // R2 = 1001, L5 = 0100, R1 = 1000 + zero padding
        assert_eq!(fingers, &[0b1001_0100, 0b1000_0000]);
    }

    #[test]
    fn test_read_back() {
        let mut pattern = DrumPattern::new(Some("Groove"), 3, Subdivision::ThirtySecondTriplet);
        pattern.set_bpm(88.0);
        pattern.toggle_step(17, 143);
        pattern.toggle_step(5, 70);

        let decoded = read_pattern(&write_pattern(&pattern)).unwrap();
        assert_eq!(decoded.name(), "Groove");
        assert_eq!(decoded.bpm(), 88);
        assert_eq!(decoded.bars(), 3);
        assert_eq!(decoded.subdivision(), Subdivision::ThirtySecondTriplet);
        assert_eq!(decoded.tracks(), pattern.tracks());
        assert_ne!(decoded.id(), pattern.id());
        assert!(decoded.id().starts_with("shared-"));
    }

    #[test]
    fn test_legacy_version() {
        // v1, 2 bars, eighth (code 1 in bits 5-4), 100 bpm, name "Old"
        let mut bytes = vec![1, (1 << 6) | (1 << 4), 0, 100, 3, b'O', b'l', b'd'];
        // 16 steps -> 2 bytes per track; kick on step 0 only
        bytes.extend_from_slice(&[0x80, 0x00]);
        bytes.extend(std::iter::repeat(0).take((PAD_COUNT - 1) * 2));
        bytes.push(0b1010_0000); // R3

        let pattern = read_pattern(&bytes).unwrap();
        assert_eq!(pattern.bars(), 2);
        assert_eq!(pattern.subdivision(), Subdivision::Eighth);
        assert_eq!(pattern.bpm(), 100);
        assert_eq!(pattern.name(), "Old");
        assert_eq!(
            pattern.step_at(0, 0).unwrap().finger(),
            FingerDesignation::new(Hand::Right, 3)
        );
        assert_eq!(pattern.active_step_count(), 1);
    }

    #[test]
    fn test_unknown_version() {
        assert!(matches!(
            read_pattern(&[9, 0, 0, 120, 0]),
            Err(CodecError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = write_pattern(&DrumPattern::default());
        assert!(matches!(
            read_pattern(&bytes[..bytes.len() - 1]),
            Err(CodecError::Truncated { .. })
        ));
        assert!(matches!(read_pattern(&[]), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_invalid_finger() {
        let mut pattern = DrumPattern::new(Some(""), 1, Subdivision::Quarter);
        pattern.toggle_step(0, 0);
        let mut bytes = write_pattern(&pattern);
        let last = bytes.len() - 1;
        bytes[last] = 0b0111_0000;
        assert!(matches!(read_pattern(&bytes), Err(CodecError::InvalidFinger(0b0111))));
    }

    #[test]
    fn test_out_of_range_bpm_is_clamped() {
        let mut bytes = write_pattern(&DrumPattern::default());
        bytes[2] = 0x03;
        bytes[3] = 0xE8; // 1000
        assert_eq!(read_pattern(&bytes).unwrap().bpm(), 200);
    }
}
