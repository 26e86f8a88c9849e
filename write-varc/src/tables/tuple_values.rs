//! Packed tuple values

use crate::{
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// Flag indicating that this run contains no data,
/// and that the values for this run are all zero.
const VALUES_ARE_ZERO: u8 = 0x80;
/// Flag indicating that values in this run are 16-bit.
const VALUES_ARE_WORDS: u8 = 0x40;
/// Both flags set: values in this run are 32-bit.
const VALUES_ARE_LONGS: u8 = VALUES_ARE_ZERO | VALUES_ARE_WORDS;

const MAX_VALUES_PER_RUN: usize = 64;

/// A sequence of signed integers, written as [packed deltas].
///
/// In addition to the 8- and 16-bit runs of the OpenType encoding, values
/// outside the `i16` range are written in 32-bit runs.
///
/// [packed deltas]: https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedDeltas {
    deltas: Vec<i32>,
}

impl Validate for PackedDeltas {
    fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
}

impl FontWrite for PackedDeltas {
    fn write_into(&self, writer: &mut TableWriter) {
        for run in self.iter_runs() {
            run.write_into(writer)
        }
    }
}

impl PackedDeltas {
    /// Construct a `PackedDeltas` from a vector of raw delta values.
    pub fn new(deltas: Vec<i32>) -> Self {
        Self { deltas }
    }

    /// The values to be written.
    pub fn deltas(&self) -> &[i32] {
        &self.deltas
    }

    /// Compute the number of bytes required to encode these deltas
    pub fn compute_size(&self) -> usize {
        self.iter_runs().map(|run| run.compute_size()).sum()
    }

    fn iter_runs(&self) -> impl Iterator<Item = PackedDeltaRun<'_>> {
        fn count_leading_zeros(slice: &[i32]) -> usize {
            slice
                .iter()
                .take(MAX_VALUES_PER_RUN)
                .take_while(|v| **v == 0)
                .count()
        }

        /// compute the number of deltas in the next run, and their width
        fn next_run_len(slice: &[i32]) -> (usize, ValueWidth) {
            let width = slice
                .first()
                .copied()
                .map(ValueWidth::for_value)
                .unwrap_or(ValueWidth::Byte);

            let mut idx = 1;
            while idx < MAX_VALUES_PER_RUN && idx < slice.len() {
                let cur = slice[idx];

                // Any reason to stop?
                let two_zeros = cur == 0 && slice.get(idx + 1) == Some(&0);
                let different_width = ValueWidth::for_value(cur) != width;
                if two_zeros || different_width {
                    break;
                }
                idx += 1;
            }
            (idx, width)
        }

        let mut deltas = self.deltas.as_slice();

        std::iter::from_fn(move || {
            if *deltas.first()? == 0 {
                let n_zeros = count_leading_zeros(deltas);
                deltas = &deltas[n_zeros..];
                log::trace!("zero run of {n_zeros}");
                Some(PackedDeltaRun::Zeros(n_zeros))
            } else {
                let (len, width) = next_run_len(deltas);
                let (head, tail) = deltas.split_at(len);
                deltas = tail;
                log::trace!("{width:?} run of {len}");
                Some(match width {
                    ValueWidth::Byte => PackedDeltaRun::OneByte(head),
                    ValueWidth::Word => PackedDeltaRun::TwoBytes(head),
                    ValueWidth::Long => PackedDeltaRun::FourBytes(head),
                })
            }
        })
    }
}

impl From<Vec<i32>> for PackedDeltas {
    fn from(deltas: Vec<i32>) -> Self {
        Self::new(deltas)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueWidth {
    Byte,
    Word,
    Long,
}

impl ValueWidth {
    fn for_value(value: i32) -> Self {
        if i8::try_from(value).is_ok() {
            ValueWidth::Byte
        } else if i16::try_from(value).is_ok() {
            ValueWidth::Word
        } else {
            ValueWidth::Long
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum PackedDeltaRun<'a> {
    Zeros(usize),
    OneByte(&'a [i32]),
    TwoBytes(&'a [i32]),
    FourBytes(&'a [i32]),
}

impl PackedDeltaRun<'_> {
    fn len(&self) -> usize {
        match self {
            PackedDeltaRun::Zeros(count) => *count,
            PackedDeltaRun::OneByte(vals)
            | PackedDeltaRun::TwoBytes(vals)
            | PackedDeltaRun::FourBytes(vals) => vals.len(),
        }
    }

    fn compute_flag(&self) -> u8 {
        // runs are never empty, and never longer than 64
        let count = (self.len() - 1) as u8;
        match self {
            PackedDeltaRun::Zeros(_) => count | VALUES_ARE_ZERO,
            PackedDeltaRun::OneByte(_) => count,
            PackedDeltaRun::TwoBytes(_) => count | VALUES_ARE_WORDS,
            PackedDeltaRun::FourBytes(_) => count | VALUES_ARE_LONGS,
        }
    }

    fn compute_size(&self) -> usize {
        match self {
            PackedDeltaRun::Zeros(_) => 1,
            PackedDeltaRun::OneByte(vals) => vals.len() + 1,
            PackedDeltaRun::TwoBytes(vals) => vals.len() * 2 + 1,
            PackedDeltaRun::FourBytes(vals) => vals.len() * 4 + 1,
        }
    }
}

impl FontWrite for PackedDeltaRun<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        self.compute_flag().write_into(writer);
        match self {
            PackedDeltaRun::Zeros(_) => (),
            PackedDeltaRun::OneByte(deltas) => {
                deltas.iter().for_each(|v| (*v as i8).write_into(writer))
            }
            PackedDeltaRun::TwoBytes(deltas) => {
                deltas.iter().for_each(|v| (*v as i16).write_into(writer))
            }
            PackedDeltaRun::FourBytes(deltas) => deltas.iter().for_each(|v| v.write_into(writer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::to_bytes;
    use read_varc::{tables::variations::TupleValues, FontData};

    static PACKED_DELTA_BYTES: &[u8] = &[
        0x03, 0x0A, 0x97, 0x00, 0xC6, 0x87, 0x41, 0x10, 0x22, 0xFB, 0x34,
    ];

    // <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas>
    #[test]
    fn packed_deltas_example_runs() {
        let deltas = PackedDeltas::new(vec![10, -105, 0, -58, 0, 0, 0, 0, 0, 0, 0, 0, 4130, -1228]);
        let runs = deltas.iter_runs().collect::<Vec<_>>();
        assert_eq!(runs[0], PackedDeltaRun::OneByte(&[10, -105, 0, -58]));
        assert_eq!(runs[1], PackedDeltaRun::Zeros(8));
        assert_eq!(runs[2], PackedDeltaRun::TwoBytes(&[4130, -1228]));
        assert!(runs.get(3).is_none());
    }

    #[test]
    fn packed_deltas_example_write() {
        let deltas = PackedDeltas::new(vec![10, -105, 0, -58, 0, 0, 0, 0, 0, 0, 0, 0, 4130, -1228]);
        let bytes = to_bytes(&deltas);
        assert_eq!(bytes, PACKED_DELTA_BYTES);
        assert_eq!(deltas.compute_size(), bytes.len());
        let read = TupleValues::read_to_end(FontData::new(&bytes)).unwrap();
        assert_eq!(read.iter().collect::<Vec<_>>(), deltas.deltas);
    }

    #[test]
    fn mixed_runs_bounded_reads() {
        let deltas = PackedDeltas::new(vec![0, 0, 0, 5, -5, 1000, -1000]);
        let bytes = to_bytes(&deltas);
        assert_eq!(
            bytes,
            [0x82, 0x01, 0x05, 0xFB, 0x41, 0x03, 0xE8, 0xFC, 0x18]
        );

        let all = TupleValues::read(FontData::new(&bytes), 7).unwrap();
        assert_eq!(all.iter().collect::<Vec<_>>(), deltas.deltas);
        assert_eq!(all.byte_len(), bytes.len());

        let head = TupleValues::read(FontData::new(&bytes), 3).unwrap();
        assert_eq!(head.iter().collect::<Vec<_>>(), [0, 0, 0]);
        assert_eq!(head.byte_len(), 1);
    }

    #[test]
    fn empty_deltas() {
        let deltas = PackedDeltas::new(vec![]);
        assert!(to_bytes(&deltas).is_empty());
        assert_eq!(deltas.compute_size(), 0);
    }

    #[test]
    fn zero_runs_are_capped() {
        let deltas = PackedDeltas::new(vec![0; 100]);
        assert_eq!(
            vec![PackedDeltaRun::Zeros(64), PackedDeltaRun::Zeros(36)],
            deltas.iter_runs().collect::<Vec<_>>()
        );
        assert_eq!(to_bytes(&deltas), [0xBF, 0xA3]);
    }

    #[test]
    fn respect_my_run_length_authority() {
        let values = (1..201).collect::<Vec<_>>();
        let deltas = PackedDeltas::new(values);
        assert_eq!(
            vec![
                // 64 entries per run please and thank you
                PackedDeltaRun::OneByte(&(1..65).collect::<Vec<i32>>()),
                // 63 entries this time because at 128 we switch to 2 bytes
                PackedDeltaRun::OneByte(&(65..128).collect::<Vec<i32>>()),
                // 64 per run again
                PackedDeltaRun::TwoBytes(&(128..192).collect::<Vec<i32>>()),
                // tail
                PackedDeltaRun::TwoBytes(&(192..=200).collect::<Vec<i32>>()),
            ],
            deltas.iter_runs().collect::<Vec<_>>()
        )
    }

    #[test]
    fn long_values() {
        let deltas = PackedDeltas::new(vec![70_000, -2_000_000_000, 3]);
        let runs = deltas.iter_runs().collect::<Vec<_>>();
        assert_eq!(
            runs,
            [
                PackedDeltaRun::FourBytes(&[70_000, -2_000_000_000]),
                PackedDeltaRun::OneByte(&[3]),
            ]
        );
        let bytes = to_bytes(&deltas);
        assert_eq!(bytes[0], 0xC1);
        assert_eq!(bytes.len(), 11);
        let read = TupleValues::read_to_end(FontData::new(&bytes)).unwrap();
        assert_eq!(read.iter().collect::<Vec<_>>(), deltas.deltas);
    }
}
