// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Raw word assembly and two's-complement decoding
//!
//! Sensor outputs span one to three consecutive registers. The lowest
//! register address always holds the least-significant byte.

use serde::{Deserialize, Serialize};

/// Width of a raw register field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitWidth {
    Bits8,
    Bits16,
    Bits24,
}

impl BitWidth {
    /// Number of bits in the field
    pub const fn bits(self) -> u32 {
        match self {
            BitWidth::Bits8 => 8,
            BitWidth::Bits16 => 16,
            BitWidth::Bits24 => 24,
        }
    }

    /// Number of consecutive registers holding the field
    pub const fn bytes(self) -> usize {
        match self {
            BitWidth::Bits8 => 1,
            BitWidth::Bits16 => 2,
            BitWidth::Bits24 => 3,
        }
    }

    const fn mask(self) -> u32 {
        (1u32 << self.bits()) - 1
    }
}

/// Assemble an unsigned word from little-endian register bytes
///
/// Only the first `width.bytes()` bytes are used; a shorter slice is
/// zero-extended.
pub fn assemble_le(bytes: &[u8], width: BitWidth) -> u32 {
    bytes
        .iter()
        .take(width.bytes())
        .enumerate()
        .fold(0u32, |word, (i, &b)| word | (u32::from(b) << (8 * i)))
}

/// Reinterpret an unsigned N-bit word as a two's-complement value
///
/// Bits above the field width are ignored.
pub fn decode_signed(raw: u32, width: BitWidth) -> i32 {
    let raw = raw & width.mask();
    let sign_bit = 1u32 << (width.bits() - 1);
    if raw & sign_bit != 0 {
        (i64::from(raw) - (1i64 << width.bits())) as i32
    } else {
        raw as i32
    }
}

/// Encode a signed value back into its N-bit two's-complement word
pub fn encode_signed(value: i32, width: BitWidth) -> u32 {
    (value as u32) & width.mask()
}

/// Split an N-bit word into little-endian register bytes
pub fn split_le(word: u32, width: BitWidth) -> Vec<u8> {
    (0..width.bytes())
        .map(|i| ((word >> (8 * i)) & 0xFF) as u8)
        .collect()
}
