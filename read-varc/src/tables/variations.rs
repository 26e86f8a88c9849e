//! Packed tuple values and variation indices
//!
//! Tuple values use the [packed deltas] run encoding from the OpenType
//! variation common formats, extended with a run type for 32-bit values.

use crate::{Cursor, FontData, ReadError};

/// Variation index that means "no variation".
///
/// Evaluating this index yields a tuple of zeros.
pub const NO_VARIATION_INDEX: u32 = 0xFFFFFFFF;

/// Flag indicating that this run contains no data,
/// and that the values for this run are all zero.
const VALUES_ARE_ZERO: u8 = 0x80;
/// Flag indicating that values in this run are 16-bit.
const VALUES_ARE_WORDS: u8 = 0x40;
/// Both flags set: values in this run are 32-bit.
const VALUES_ARE_LONGS: u8 = VALUES_ARE_ZERO | VALUES_ARE_WORDS;
/// Mask for the low 6 bits to provide the number of values in the run, minus one.
const VALUE_RUN_COUNT_MASK: u8 = 0x3F;

/// A sequence of signed integers stored as [packed deltas].
///
/// The run structure is validated when the values are read, so iteration
/// never fails.
///
/// [packed deltas]: https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas
#[derive(Clone, Debug)]
pub struct TupleValues<'a> {
    data: FontData<'a>,
    count: usize,
}

impl<'a> TupleValues<'a> {
    /// Read exactly `count` values from the start of `data`.
    ///
    /// Decoding stops as soon as `count` values have been produced, even if
    /// that is partway through a run. Use [`byte_len`](Self::byte_len) to find
    /// the number of bytes consumed.
    pub fn read(data: FontData<'a>, count: usize) -> Result<Self, ReadError> {
        let byte_len = scan_runs(data, Some(count))?.1;
        Ok(Self {
            data: data.slice(..byte_len).unwrap_or_default(),
            count,
        })
    }

    /// Read values until all of `data` has been consumed.
    pub fn read_to_end(data: FontData<'a>) -> Result<Self, ReadError> {
        let (count, _) = scan_runs(data, None)?;
        Ok(Self { data, count })
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The number of bytes occupied by the encoded values.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Iterate over the values.
    pub fn iter(&self) -> TupleValuesIter<'a> {
        TupleValuesIter {
            remaining: self.count,
            run_remaining: 0,
            run_kind: RunKind::Zero,
            cursor: self.data.cursor(),
        }
    }

    /// Add each value multiplied by `scalar` into the corresponding slot of `out`.
    ///
    /// Extra values or extra slots are ignored.
    pub fn add_scaled_to(&self, out: &mut [f32], scalar: f32) {
        for (slot, value) in out.iter_mut().zip(self.iter()) {
            *slot += value as f32 * scalar;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunKind {
    Zero,
    Byte,
    Word,
    Long,
}

impl RunKind {
    fn from_control(control: u8) -> Self {
        match control & VALUES_ARE_LONGS {
            VALUES_ARE_LONGS => RunKind::Long,
            VALUES_ARE_ZERO => RunKind::Zero,
            VALUES_ARE_WORDS => RunKind::Word,
            _ => RunKind::Byte,
        }
    }

    fn value_size(self) -> usize {
        match self {
            RunKind::Zero => 0,
            RunKind::Byte => 1,
            RunKind::Word => 2,
            RunKind::Long => 4,
        }
    }
}

/// Walk the runs in `data`, returning the number of values and the number
/// of bytes they occupy.
///
/// With a `limit`, stops after that many values; otherwise stops at the end
/// of the data.
fn scan_runs(data: FontData, limit: Option<usize>) -> Result<(usize, usize), ReadError> {
    let mut pos = 0usize;
    let mut count = 0usize;
    loop {
        match limit {
            Some(limit) if count >= limit => break,
            None if pos >= data.len() => break,
            _ => (),
        }
        let control = data
            .read_at::<u8>(pos)
            .map_err(|_| ReadError::MalformedTuple(data.absolute(pos)))?;
        let kind = RunKind::from_control(control);
        let run_len = (control & VALUE_RUN_COUNT_MASK) as usize + 1;
        let take = match limit {
            Some(limit) => run_len.min(limit - count),
            None => run_len,
        };
        let end = pos + 1 + take * kind.value_size();
        if end > data.len() {
            return Err(ReadError::MalformedTuple(data.absolute(pos)));
        }
        pos = end;
        count += take;
    }
    Ok((count, pos))
}

/// An iterator over the values in a [`TupleValues`].
#[derive(Clone, Debug)]
pub struct TupleValuesIter<'a> {
    remaining: usize,
    run_remaining: usize,
    run_kind: RunKind,
    cursor: Cursor<'a>,
}

impl Iterator for TupleValuesIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // runs were validated on construction, so none of these reads fail
        while self.run_remaining == 0 {
            let control: u8 = self.cursor.read().ok()?;
            self.run_kind = RunKind::from_control(control);
            self.run_remaining = (control & VALUE_RUN_COUNT_MASK) as usize + 1;
        }
        self.run_remaining -= 1;
        self.remaining -= 1;
        match self.run_kind {
            RunKind::Zero => Some(0),
            RunKind::Byte => self.cursor.read::<i8>().ok().map(|v| v as i32),
            RunKind::Word => self.cursor.read::<i16>().ok().map(|v| v as i32),
            RunKind::Long => self.cursor.read::<i32>().ok(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TupleValuesIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn collect(values: &TupleValues) -> Vec<i32> {
        values.iter().collect()
    }

    // https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas
    #[test]
    fn packed_deltas_example() {
        static INPUT: FontData = FontData::new(&[
            0x03, 0x0A, 0x97, 0x00, 0xC6, 0x87, 0x41, 0x10, 0x22, 0xFB, 0x34,
        ]);
        static EXPECTED: &[i32] = &[10, -105, 0, -58, 0, 0, 0, 0, 0, 0, 0, 0, 4130, -1228];

        let values = TupleValues::read_to_end(INPUT).unwrap();
        assert_eq!(values.len(), EXPECTED.len());
        assert_eq!(collect(&values), EXPECTED);
    }

    // [0, 0, 0, 5, -5, 1000, -1000]
    fn mixed_runs() -> BeBuffer {
        BeBuffer::new()
            .push(0x82u8)
            .push(0x01u8)
            .extend([5i8, -5])
            .push(0x41u8)
            .extend([1000i16, -1000])
    }

    #[test]
    fn bounded_reads_exact_count() {
        let buf = mixed_runs();
        let values = TupleValues::read(buf.font_data(), 7).unwrap();
        assert_eq!(collect(&values), [0, 0, 0, 5, -5, 1000, -1000]);
        assert_eq!(values.byte_len(), buf.len());
    }

    #[test]
    fn bounded_stops_mid_stream() {
        let buf = mixed_runs();
        let values = TupleValues::read(buf.font_data(), 3).unwrap();
        assert_eq!(collect(&values), [0, 0, 0]);
        assert_eq!(values.byte_len(), 1);
    }

    #[test]
    fn bounded_stops_mid_run() {
        let buf = mixed_runs();
        let values = TupleValues::read(buf.font_data(), 4).unwrap();
        assert_eq!(collect(&values), [0, 0, 0, 5]);
        // the zero run, the control byte, and one value
        assert_eq!(values.byte_len(), 3);
    }

    #[test]
    fn bounded_ignores_trailing_bytes() {
        let buf = BeBuffer::new().push(0x80u8).extend([0xffu8; 4]);
        let values = TupleValues::read(buf.font_data(), 1).unwrap();
        assert_eq!(collect(&values), [0]);
        assert_eq!(values.byte_len(), 1);
    }

    #[test]
    fn thirty_two_bit_run() {
        let buf = BeBuffer::new()
            .push(0xC1u8)
            .extend([100_000i32, -2_000_000_000])
            .push(0x00u8)
            .push(7i8);
        let values = TupleValues::read_to_end(buf.font_data()).unwrap();
        assert_eq!(collect(&values), [100_000, -2_000_000_000, 7]);
    }

    #[test]
    fn zero_count() {
        let values = TupleValues::read(FontData::EMPTY, 0).unwrap();
        assert!(values.is_empty());
        assert_eq!(values.byte_len(), 0);
        assert!(TupleValues::read_to_end(FontData::EMPTY).unwrap().is_empty());
    }

    #[test]
    fn run_past_end() {
        // claims four words, has one
        let buf = BeBuffer::new().push(0x00u8).push(1i8).push(0x43u8).push(1i16);
        assert_eq!(
            TupleValues::read_to_end(buf.font_data()).unwrap_err(),
            ReadError::MalformedTuple(2)
        );
        // a bounded read that stops before the bad run is fine
        assert_eq!(
            collect(&TupleValues::read(buf.font_data(), 1).unwrap()),
            [1]
        );
        assert!(TupleValues::read(buf.font_data(), 2).is_ok());
        assert!(TupleValues::read(buf.font_data(), 3).is_err());
    }

    #[test]
    fn not_enough_values() {
        let buf = BeBuffer::new().push(0x81u8);
        assert_eq!(
            TupleValues::read(buf.font_data(), 3).unwrap_err(),
            ReadError::MalformedTuple(1)
        );
    }

    #[test]
    fn scaled_accumulate() {
        let buf = mixed_runs();
        let values = TupleValues::read_to_end(buf.font_data()).unwrap();
        let mut out = [1.0f32; 7];
        values.add_scaled_to(&mut out, 0.5);
        assert_eq!(out, [1.0, 1.0, 1.0, 3.5, -1.5, 501.0, -499.0]);
    }
}
