//! Variable length 32-bit unsigned integers
//!
//! A `Uint32Var` takes 1 to 5 bytes. The number of leading one bits in the
//! first byte gives the number of bytes that follow:
//!
//! | first byte    | length | value                                  |
//! |---------------|--------|----------------------------------------|
//! | `0x00..=0x7F` | 1      | `b0`                                   |
//! | `0x80..=0xBF` | 2      | `(b0 & 0x3F) << 8 \| b1`               |
//! | `0xC0..=0xDF` | 3      | `(b0 & 0x1F) << 16 \| b1 << 8 \| b2`   |
//! | `0xE0..=0xEF` | 4      | `(b0 & 0x0F) << 24 \| ...`             |
//! | `0xF0..=0xFF` | 5      | the following four bytes, big-endian   |
//!
//! In the five byte form the low bits of the first byte are ignored.
//!
//! See <https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md#uint32var>

use crate::{FontData, ReadError};

/// The number of bytes in an encoding that starts with `first`.
pub fn encoded_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0x80..=0xBF => 2,
        0xC0..=0xDF => 3,
        0xE0..=0xEF => 4,
        0xF0..=0xFF => 5,
    }
}

/// Decode a `Uint32Var` at `offset`, returning the value and the number of
/// bytes it occupies.
pub fn read_u32_var(data: FontData, offset: usize) -> Result<(u32, usize), ReadError> {
    let first = data.read_at::<u8>(offset)?;
    let len = encoded_len(first);
    let bytes = data
        .as_bytes()
        .get(offset..offset + len)
        .ok_or(ReadError::TruncatedInput(data.absolute(offset)))?;
    let value = match len {
        1 => first as u32,
        2 => ((first as u32 & 0x3F) << 8) | bytes[1] as u32,
        3 => ((first as u32 & 0x1F) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32,
        4 => {
            ((first as u32 & 0x0F) << 24)
                | ((bytes[1] as u32) << 16)
                | ((bytes[2] as u32) << 8)
                | bytes[3] as u32
        }
        _ => u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
    };
    Ok((value, len))
}
