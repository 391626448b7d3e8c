//! Payload bit strings: one `u8` (0 or 1) per bit, most significant bit of
//! each byte first.

use crate::error::{Error, Result};

/// End-of-message marker: fifteen ones then a zero.
pub const TERMINATOR: [u8; 16] = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0];

pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bp in (0..8).rev() {
            bits.push((byte >> bp) & 1);
        }
    }
    bits
}

/// Packs bits back into bytes.  The length must be a multiple of eight.
pub fn bits_to_bytes(bits: &[u8]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::PartialByte(bits.len()));
    }
    Ok(bits
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect())
}

/// Index of the first bit of the first terminator occurrence.
pub fn find_terminator(bits: &[u8]) -> Option<usize> {
    bits.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

/// `payload ++ TERMINATOR`, rejecting payloads whose bits would make the
/// marker appear early and cut the message short on decode.
pub fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let mut framed = Vec::with_capacity(payload.len() + TERMINATOR.len());
    framed.extend_from_slice(payload);
    framed.extend_from_slice(&TERMINATOR);
    match find_terminator(&framed) {
        Some(pos) if pos < payload.len() => Err(Error::PayloadContainsTerminator(pos)),
        _ => Ok(framed),
    }
}
