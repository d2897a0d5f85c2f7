// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Share-link codec.
//!
//! Converts a pattern to and from a short URL-safe string:
//! binary layout -> zlib deflate -> base64 with the `-_` alphabet, no padding.
//!
//! The `try_*` functions report why a conversion failed. [`encode`] and
//! [`decode`] collapse every failure into `None`, which is what link handling
//! wants: a bad link is simply "no pattern".

pub mod binary;
pub mod text;

use thiserror::Error;
use tracing::debug;

use crate::pattern::DrumPattern;

pub use binary::{FORMAT_VERSION, LEGACY_FORMAT_VERSION};

/// Longest encoded string the encoder will produce or the decoder will accept
pub const MAX_ENCODED_LEN: usize = 2000;

/// Upper bound on the inflated buffer (largest possible pattern is ~2.4 KB)
pub const MAX_DECODED_BYTES: usize = 4096;

/// Reasons a pattern could not be encoded or decoded
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encoded pattern is empty")]
    Empty,
    #[error("encoded pattern is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("compression failed: {0}")]
    Compress(std::io::Error),
    #[error("corrupt compressed data: {0}")]
    Decompress(std::io::Error),
    #[error("decompressed pattern exceeds {0} bytes")]
    Oversized(usize),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("pattern data ends early at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },
    #[error("invalid finger field {0:#06b}")]
    InvalidFinger(u8),
}

/// Codec with a configurable length limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternCodec {
    max_encoded_len: usize,
}

impl Default for PatternCodec {
    fn default() -> Self {
        Self::new(MAX_ENCODED_LEN)
    }
}

impl PatternCodec {
    pub fn new(max_encoded_len: usize) -> Self {
        Self { max_encoded_len }
    }

    pub fn max_encoded_len(&self) -> usize {
        self.max_encoded_len
    }

    /// Encode a pattern, failing if the result would exceed the length limit
    pub fn try_encode(&self, pattern: &DrumPattern) -> Result<String, CodecError> {
        let raw = binary::write_pattern(pattern);
        let packed = text::compress(&raw)?;
        let encoded = text::to_url_safe(&packed);
        if encoded.len() > self.max_encoded_len {
            return Err(CodecError::TooLong {
                len: encoded.len(),
                max: self.max_encoded_len,
            });
        }
        Ok(encoded)
    }

    /// Decode a share string. The pattern gets a new id.
    pub fn try_decode(&self, encoded: &str) -> Result<DrumPattern, CodecError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(CodecError::Empty);
        }
        if encoded.len() > self.max_encoded_len {
            return Err(CodecError::TooLong {
                len: encoded.len(),
                max: self.max_encoded_len,
            });
        }
        let packed = text::from_url_safe(encoded)?;
        let raw = text::decompress(&packed, MAX_DECODED_BYTES)?;
        binary::read_pattern(&raw)
    }

    pub fn encode(&self, pattern: &DrumPattern) -> Option<String> {
        self.try_encode(pattern)
            .map_err(|e| debug!(pattern = pattern.id(), error = %e, "pattern not encoded"))
            .ok()
    }

    pub fn decode(&self, encoded: &str) -> Option<DrumPattern> {
        self.try_decode(encoded)
            .map_err(|e| debug!(error = %e, "share string rejected"))
            .ok()
    }
}

/// Encode with the default length limit
pub fn encode(pattern: &DrumPattern) -> Option<String> {
    PatternCodec::default().encode(pattern)
}

/// Decode with the default length limit
pub fn decode(encoded: &str) -> Option<DrumPattern> {
    PatternCodec::default().decode(encoded)
}
