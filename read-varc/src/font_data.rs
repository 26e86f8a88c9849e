//! raw table bytes

use std::ops::{Bound, Range, RangeBounds};

use types::{BigEndian, Scalar};

use crate::read::{FontRead, ReadError};

/// A reference to raw binary table data.
///
/// This is a wrapper around a byte slice, that provides convenience methods
/// for parsing and validating that data.
///
/// Each `FontData` remembers its position within the buffer it was sliced
/// from, so that errors can report absolute offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    total_pos: u32,
    bytes: &'a [u8],
}

/// A cursor for validating bytes during parsing.
///
/// Reads advance the cursor; the cursor's position is the number of bytes
/// consumed so far.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> FontData<'a> {
    /// Empty data, useful for some tests and examples
    pub const EMPTY: FontData<'static> = FontData {
        total_pos: 0,
        bytes: &[],
    };

    /// Create a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData {
            total_pos: 0,
            bytes,
        }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The offset of the start of this data within the root buffer.
    pub fn position(&self) -> u32 {
        self.total_pos
    }

    /// The absolute offset of `pos`, for error reporting.
    pub(crate) fn absolute(&self, pos: usize) -> u32 {
        self.total_pos.saturating_add(pos.min(u32::MAX as usize) as u32)
    }

    /// Returns self[pos..]
    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData {
            bytes,
            total_pos: self.absolute(pos),
        })
    }

    /// returns self[..pos], and updates self to = self[pos..];
    pub fn take_up_to(&mut self, pos: usize) -> Option<FontData<'a>> {
        if pos > self.len() {
            return None;
        }
        let (head, tail) = self.bytes.split_at(pos);
        let result = FontData {
            total_pos: self.total_pos,
            bytes: head,
        };
        self.total_pos = self.absolute(pos);
        self.bytes = tail;
        Some(result)
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(i) => *i,
            Bound::Excluded(i) => i.saturating_add(1),
        };

        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        let total_pos = self.absolute(start);
        self.bytes
            .get(bounds)
            .map(|bytes| FontData { bytes, total_pos })
    }

    /// Read a scalar at the provided location in the data.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        let end = offset
            .checked_add(T::RAW_BYTE_LEN)
            .ok_or(ReadError::TruncatedInput(self.absolute(offset)))?;
        self.bytes
            .get(offset..end)
            .and_then(T::read)
            .ok_or(ReadError::TruncatedInput(self.absolute(offset)))
    }

    /// Interpret the bytes in `range` as an array of big-endian scalars.
    pub fn read_array<T: Scalar + Copy + 'static>(
        &self,
        range: Range<usize>,
    ) -> Result<&'a [BigEndian<T>], ReadError> {
        let start = range.start;
        let bytes = self
            .bytes
            .get(range)
            .ok_or(ReadError::TruncatedInput(self.absolute(start)))?;
        bytemuck::try_cast_slice(bytes)
            .map_err(|_| ReadError::MalformedData("array length not a multiple of item size"))
    }

    /// Parse a `T` from the data starting at `offset`.
    pub fn read_subtable<T: FontRead<'a>>(&self, offset: usize) -> Result<T, ReadError> {
        self.split_off(offset)
            .ok_or(ReadError::TruncatedInput(self.absolute(offset)))
            .and_then(T::read)
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    /// Return the data as a byte slice
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Cursor<'a> {
    pub(crate) fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    /// Read a scalar and advance past it.
    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let temp = self.data.read_at(self.pos);
        self.pos = self.pos.saturating_add(T::RAW_BYTE_LEN);
        temp
    }

    /// Read `len` big-endian scalars and advance past them.
    pub fn read_array<T: Scalar + Copy + 'static>(
        &mut self,
        len: usize,
    ) -> Result<&'a [BigEndian<T>], ReadError> {
        let len = len.saturating_mul(T::RAW_BYTE_LEN);
        let end = self.pos.saturating_add(len);
        let temp = self.data.read_array(self.pos..end);
        self.pos = end;
        temp
    }

    /// Read a variable-length `Uint32Var` and advance past it.
    ///
    /// See [`crate::var_int`] for the encoding.
    pub fn read_u32_var(&mut self) -> Result<u32, ReadError> {
        let (value, len) = crate::var_int::read_u32_var(self.data, self.pos)?;
        self.pos += len;
        Ok(value)
    }

    /// The current position of the cursor, relative to the start of its data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The absolute offset of the cursor, for error reporting.
    pub(crate) fn absolute_position(&self) -> u32 {
        self.data.absolute(self.pos)
    }

    /// The number of bytes left to read.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns `true` if there are no bytes left to read.
    pub fn is_empty(&self) -> bool {
        self.remaining_bytes() == 0
    }

    /// The data that has not yet been read.
    pub fn remaining(&self) -> Option<FontData<'a>> {
        self.data.split_off(self.pos)
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(src: &'a [u8]) -> FontData<'a> {
        FontData::new(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_offsets_in_errors() {
        let bytes = [0u8, 1, 2, 3, 4, 5];
        let data = FontData::new(&bytes);
        let tail = data.split_off(4).unwrap();
        assert_eq!(tail.position(), 4);
        assert_eq!(tail.read_at::<u16>(0), Ok(0x0405));
        assert_eq!(tail.read_at::<u16>(1), Err(ReadError::TruncatedInput(5)));
        let sliced = data.slice(2..4).unwrap();
        assert_eq!(sliced.read_at::<u32>(0), Err(ReadError::TruncatedInput(2)));
    }

    #[test]
    fn cursor_reads() {
        let bytes = [0x00, 0x2a, 0xff, 0xfe, 0x00, 0x01, 0x00, 0x02];
        let mut cursor = FontData::new(&bytes).cursor();
        assert_eq!(cursor.read::<u16>(), Ok(42));
        assert_eq!(cursor.read::<i16>(), Ok(-2));
        let array = cursor.read_array::<u16>(2).unwrap();
        assert_eq!(array.iter().map(|x| x.get()).collect::<Vec<_>>(), [1, 2]);
        assert!(cursor.is_empty());
        assert!(cursor.read::<u8>().is_err());
    }

    #[test]
    fn take_up_to() {
        let bytes = [1u8, 2, 3];
        let mut data = FontData::new(&bytes);
        let head = data.take_up_to(1).unwrap();
        assert_eq!(head.as_bytes(), &[1]);
        assert_eq!(data.as_bytes(), &[2, 3]);
        assert_eq!(data.position(), 1);
        assert!(data.take_up_to(3).is_none());
    }
}
