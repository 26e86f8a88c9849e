//! Indices of variable sized items.
//!
//! These use the layout of the CFF2 [INDEX] structure: a 32-bit count, an
//! offset size, `count + 1` one-based offsets and the concatenated item data.
//!
//! [INDEX]: https://learn.microsoft.com/en-us/typography/opentype/spec/cff2#5-index-data

use std::marker::PhantomData;

use types::Uint24;

use crate::{FontData, FontRead, ReadError};

/// An index of variable sized byte strings, with a 32-bit count.
#[derive(Clone, Copy, Debug)]
pub struct Index2<'a> {
    count: u32,
    off_size: u8,
    offsets: FontData<'a>,
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Index2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let count: u32 = cursor.read()?;
        if count == 0 {
            // An empty index contains only the count field
            return Ok(Self {
                count,
                off_size: 0,
                offsets: FontData::EMPTY,
                data: FontData::EMPTY,
            });
        }
        let off_size: u8 = cursor.read()?;
        if !(1..=4).contains(&off_size) {
            return Err(ReadError::CorruptOffsets(0));
        }
        let offsets_len = (count as usize)
            .saturating_add(1)
            .saturating_mul(off_size as usize);
        let start = cursor.position();
        let offsets = data
            .slice(start..start.saturating_add(offsets_len))
            .ok_or(ReadError::TruncatedInput(data.absolute(start)))?;
        let data = data
            .split_off(start + offsets_len)
            .unwrap_or_default();
        Ok(Self {
            count,
            off_size,
            offsets,
            data,
        })
    }
}

impl<'a> Index2<'a> {
    /// The number of items in the index.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The size of each offset, in bytes.
    pub fn off_size(&self) -> u8 {
        self.off_size
    }

    /// Returns the total size in bytes of the index.
    pub fn size_in_bytes(&self) -> Result<usize, ReadError> {
        // 4 byte count + 1 byte off_size
        const HEADER_SIZE: usize = 5;
        // An empty index contains only a 4 byte count field
        const EMPTY_SIZE: usize = 4;
        let count = self.count as usize;
        Ok(match count {
            0 => EMPTY_SIZE,
            _ => HEADER_SIZE + self.offsets.len() + self.get_offset(count)?,
        })
    }

    /// Returns the zero-based offset into the item data for the given
    /// offset array position.
    ///
    /// Valid positions are `0..=count`.
    pub fn get_offset(&self, index: usize) -> Result<usize, ReadError> {
        if index > self.count as usize {
            return Err(ReadError::IndexOutOfRange {
                index: index as u32,
                count: self.count,
            });
        }
        let pos = index * self.off_size as usize;
        let raw = match self.off_size {
            1 => self.offsets.read_at::<u8>(pos)? as usize,
            2 => self.offsets.read_at::<u16>(pos)? as usize,
            3 => self.offsets.read_at::<Uint24>(pos)?.to_u32() as usize,
            _ => self.offsets.read_at::<u32>(pos)? as usize,
        };
        // "Offsets in the offset array are relative to the byte that precedes
        // the object data. Therefore the first element of the offset array is
        // always 1."
        let offset = raw
            .checked_sub(1)
            .ok_or(ReadError::CorruptOffsets(index as u32))?;
        if offset > self.data.len() {
            return Err(ReadError::CorruptOffsets(index as u32));
        }
        Ok(offset)
    }

    /// Returns the data for the item at the given index.
    pub fn get(&self, index: usize) -> Result<FontData<'a>, ReadError> {
        if index >= self.count as usize {
            return Err(ReadError::IndexOutOfRange {
                index: index.min(u32::MAX as usize) as u32,
                count: self.count,
            });
        }
        let start = self.get_offset(index)?;
        let end = self
            .get_offset(index + 1)
            .map_err(|_| ReadError::CorruptOffsets(index as u32))?;
        if end < start {
            return Err(ReadError::CorruptOffsets(index as u32));
        }
        self.data
            .slice(start..end)
            .ok_or(ReadError::CorruptOffsets(index as u32))
    }

    /// Iterate over the data for each item.
    pub fn iter(&self) -> impl Iterator<Item = Result<FontData<'a>, ReadError>> + '_ {
        (0..self.count as usize).map(|ix| self.get(ix))
    }
}

/// An [`Index2`] where each item is parsed as a `T`.
pub struct Index2Of<'a, T> {
    index: Index2<'a>,
    phantom: PhantomData<fn() -> T>,
}

// manual impls so that `T` is not required to be `Clone`
impl<T> Clone for Index2Of<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index2Of<'_, T> {}

impl<'a, T> FontRead<'a> for Index2Of<'a, T> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Index2::read(data).map(Self::new)
    }
}

impl<'a, T> Index2Of<'a, T> {
    pub fn new(index: Index2<'a>) -> Self {
        Self {
            index,
            phantom: PhantomData,
        }
    }

    /// The number of items in the index.
    pub fn count(&self) -> u32 {
        self.index.count()
    }

    /// The untyped index.
    pub fn raw(&self) -> &Index2<'a> {
        &self.index
    }
}

impl<'a, T: FontRead<'a>> Index2Of<'a, T> {
    /// Parse the item at the given index.
    pub fn get(&self, index: usize) -> Result<T, ReadError> {
        self.index.get(index).and_then(T::read)
    }
}

impl<T> std::fmt::Debug for Index2Of<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index2Of")
            .field("count", &self.index.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn make_index(off_size: u8, items: &[&[u8]]) -> BeBuffer {
        let mut buf = BeBuffer::new().push(items.len() as u32);
        if items.is_empty() {
            return buf;
        }
        buf = buf.push(off_size);
        let mut offset = 1u32;
        let mut offsets = vec![offset];
        for item in items {
            offset += item.len() as u32;
            offsets.push(offset);
        }
        for offset in offsets {
            buf = match off_size {
                1 => buf.push(offset as u8),
                2 => buf.push(offset as u16),
                3 => buf.push(Uint24::new(offset)),
                _ => buf.push(offset),
            };
        }
        for item in items {
            buf = buf.extend(item.iter().copied());
        }
        buf
    }

    #[test]
    fn read_items_all_offset_sizes() {
        let items: [&[u8]; 3] = [b"hello", b"", b"index"];
        for off_size in 1..=4 {
            let buf = make_index(off_size, &items);
            let index = Index2::read(buf.font_data()).unwrap();
            assert_eq!(index.count(), 3);
            assert_eq!(index.off_size(), off_size);
            for (i, item) in items.iter().enumerate() {
                assert_eq!(index.get(i).unwrap().as_bytes(), *item);
            }
            assert_eq!(index.size_in_bytes().unwrap(), buf.len());
            assert_eq!(index.iter().count(), 3);
        }
    }

    #[test]
    fn empty_index() {
        let buf = make_index(1, &[]);
        let index = Index2::read(buf.font_data()).unwrap();
        assert_eq!(index.count(), 0);
        assert_eq!(index.size_in_bytes().unwrap(), 4);
        assert_eq!(
            index.get(0).unwrap_err(),
            ReadError::IndexOutOfRange { index: 0, count: 0 }
        );
    }

    #[test]
    fn out_of_range() {
        let buf = make_index(2, &[b"a", b"b"]);
        let index = Index2::read(buf.font_data()).unwrap();
        assert_eq!(
            index.get(2).unwrap_err(),
            ReadError::IndexOutOfRange { index: 2, count: 2 }
        );
    }

    #[test]
    fn bad_off_size() {
        let buf = BeBuffer::new().push(1u32).push(5u8).extend([1u8, 2]);
        assert_eq!(
            Index2::read(buf.font_data()).unwrap_err(),
            ReadError::CorruptOffsets(0)
        );
    }

    #[test]
    fn truncated_offsets() {
        let buf = BeBuffer::new().push(3u32).push(2u8).extend([1u16, 2]);
        assert_eq!(
            Index2::read(buf.font_data()).unwrap_err(),
            ReadError::TruncatedInput(5)
        );
    }

    #[test]
    fn corrupt_offsets() {
        // zero offset
        let buf = BeBuffer::new()
            .push(1u32)
            .push(1u8)
            .extend([0u8, 2])
            .push(0xaau8);
        let index = Index2::read(buf.font_data()).unwrap();
        assert_eq!(index.get(0).unwrap_err(), ReadError::CorruptOffsets(0));

        // decreasing offsets
        let buf = BeBuffer::new()
            .push(2u32)
            .push(1u8)
            .extend([1u8, 3, 2])
            .extend([0xaau8, 0xbb]);
        let index = Index2::read(buf.font_data()).unwrap();
        assert!(index.get(0).is_ok());
        assert_eq!(index.get(1).unwrap_err(), ReadError::CorruptOffsets(1));

        // past the end of the data
        let buf = BeBuffer::new()
            .push(1u32)
            .push(1u8)
            .extend([1u8, 9])
            .extend([0xaau8, 0xbb]);
        let index = Index2::read(buf.font_data()).unwrap();
        assert_eq!(index.get(0).unwrap_err(), ReadError::CorruptOffsets(0));
    }

    #[derive(Debug, PartialEq)]
    struct Pair(u8, u8);

    impl<'a> FontRead<'a> for Pair {
        fn read(data: FontData<'a>) -> Result<Self, ReadError> {
            Ok(Pair(data.read_at(0)?, data.read_at(1)?))
        }
    }

    #[test]
    fn typed_items() {
        let buf = make_index(1, &[&[1, 2], &[3]]);
        let index = Index2Of::<Pair>::read(buf.font_data()).unwrap();
        assert_eq!(index.count(), 2);
        assert_eq!(index.get(0).unwrap(), Pair(1, 2));
        // errors from the item parser carry absolute offsets
        assert_eq!(index.get(1).unwrap_err(), ReadError::TruncatedInput(11));
    }
}
