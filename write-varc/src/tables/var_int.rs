//! Variable-length unsigned integers

use crate::write::{FontWrite, TableWriter};

/// A variable Uint32
///
/// Written in the shortest of the five encodings that can hold the value.
///
/// See <https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md#uint32var>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint32Var(pub u32);

impl Uint32Var {
    /// The number of bytes this value occupies when written.
    pub const fn encoded_len(self) -> usize {
        match self.0 {
            0..0x80 => 1,
            0x80..0x4000 => 2,
            0x4000..0x200000 => 3,
            0x200000..0x10000000 => 4,
            _ => 5,
        }
    }
}

impl From<u32> for Uint32Var {
    fn from(value: u32) -> Self {
        Uint32Var(value)
    }
}

impl FontWrite for Uint32Var {
    fn write_into(&self, writer: &mut TableWriter) {
        let value = self.0;
        let bytes = value.to_be_bytes();
        match self.encoded_len() {
            1 => writer.write_slice(&bytes[3..]),
            2 => writer.write_slice(&[bytes[2] | 0x80, bytes[3]]),
            3 => writer.write_slice(&[bytes[1] | 0xC0, bytes[2], bytes[3]]),
            4 => writer.write_slice(&[bytes[0] | 0xE0, bytes[1], bytes[2], bytes[3]]),
            _ => {
                0xF0u8.write_into(writer);
                writer.write_slice(&bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::to_bytes;
    use read_varc::{var_int::read_u32_var, FontData};

    #[test]
    fn write_uint32var() {
        assert_eq!(to_bytes(&Uint32Var(0x7F)), [0x7F]);
        assert_eq!(to_bytes(&Uint32Var(0x3FFF)), [0xBF, 0xFF]);
        assert_eq!(to_bytes(&Uint32Var(0x1FFFFF)), [0xDF, 0xFF, 0xFF]);
        assert_eq!(to_bytes(&Uint32Var(0x0FFFFFFF)), [0xEF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            to_bytes(&Uint32Var(0xB2D05E00)),
            [0xF0, 0xB2, 0xD0, 0x5E, 0x00]
        );
    }

    #[test]
    fn round_trip_shortest_form() {
        for (value, len) in [
            (0, 1),
            (1, 1),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (0x1FFFFF, 3),
            (0x200000, 4),
            (0xFFFFFFF, 4),
            (0x10000000, 5),
            (0xFFFFFFFF, 5),
        ] {
            let bytes = to_bytes(&Uint32Var(value));
            assert_eq!(bytes.len(), len, "{value:#X}");
            assert_eq!(Uint32Var(value).encoded_len(), len);
            let (decoded, read_len) = read_u32_var(FontData::new(&bytes), 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(read_len, len);
        }
    }
}
