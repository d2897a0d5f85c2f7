// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hand and finger assignments for practice guidance.

use std::fmt;

/// Which hand plays a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Single-letter label used in grids and logs
    pub fn letter(self) -> char {
        match self {
            Hand::Left => 'L',
            Hand::Right => 'R',
        }
    }
}

/// A hand plus a finger number (1 = thumb, 5 = pinky)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerDesignation {
    hand: Hand,
    finger: u8,
}

impl FingerDesignation {
    /// Create a finger designation, returning None if the finger is outside 1..=5
    pub fn new(hand: Hand, finger: u8) -> Option<Self> {
        if (1..=5).contains(&finger) {
            Some(Self { hand, finger })
        } else {
            None
        }
    }

    /// Left-hand shorthand for table definitions, where the finger is known valid
    pub(crate) const fn left(finger: u8) -> Self {
        Self {
            hand: Hand::Left,
            finger,
        }
    }

    /// Right-hand shorthand for table definitions, where the finger is known valid
    pub(crate) const fn right(finger: u8) -> Self {
        Self {
            hand: Hand::Right,
            finger,
        }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn finger(&self) -> u8 {
        self.finger
    }

    /// Pack into the 4-bit wire field: hand in bit 3, finger-1 in bits 2-0
    pub(crate) fn to_nibble(self) -> u8 {
        let hand_bit = match self.hand {
            Hand::Left => 0,
            Hand::Right => 1,
        };
        (hand_bit << 3) | (self.finger - 1)
    }

    /// Unpack a 4-bit wire field
    pub(crate) fn from_nibble(nibble: u8) -> Option<Self> {
        let hand = if nibble & 0b1000 == 0 {
            Hand::Left
        } else {
            Hand::Right
        };
        Self::new(hand, (nibble & 0b0111) + 1)
    }
}

impl fmt::Display for FingerDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.hand.letter(), self.finger)
    }
}
