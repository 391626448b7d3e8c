//! LSB steganography: payload bits go into the least significant bit of each
//! successive 8-bit channel value, followed by a 16-bit end marker.

pub mod bits;
pub mod codec;

pub use bits::{bits_to_bytes, bytes_to_bits, TERMINATOR};
pub use codec::{decode, decode_file, decode_message, encode, encode_file, encode_message};
