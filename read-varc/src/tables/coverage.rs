//! OpenType [coverage tables](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)

use types::{BigEndian, GlyphId, GlyphId16};

use crate::{FontData, FontRead, ReadError};

/// A coverage table, mapping glyph ids to coverage indices.
#[derive(Clone, Debug)]
pub enum CoverageTable<'a> {
    Format1(CoverageFormat1<'a>),
    Format2(CoverageFormat2<'a>),
}

/// Coverage format 1: a sorted array of glyph ids.
#[derive(Clone, Debug)]
pub struct CoverageFormat1<'a> {
    glyph_array: &'a [BigEndian<GlyphId16>],
}

/// Coverage format 2: sorted ranges of glyph ids.
#[derive(Clone, Debug)]
pub struct CoverageFormat2<'a> {
    range_records: &'a [RangeRecord],
}

/// A range of consecutive glyph ids, and the coverage index of the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck_derive::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct RangeRecord {
    start_glyph_id: BigEndian<GlyphId16>,
    end_glyph_id: BigEndian<GlyphId16>,
    start_coverage_index: BigEndian<u16>,
}

impl<'a> FontRead<'a> for CoverageTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => {
                let count: u16 = data.read_at(2)?;
                let glyph_array = data.read_array(4..4 + count as usize * 2)?;
                Ok(Self::Format1(CoverageFormat1 { glyph_array }))
            }
            2 => {
                let count: u16 = data.read_at(2)?;
                let len = count as usize * std::mem::size_of::<RangeRecord>();
                let bytes = data
                    .slice(4..4 + len)
                    .ok_or(ReadError::TruncatedInput(data.position() + 4))?;
                let range_records = bytemuck::try_cast_slice(bytes.as_bytes())
                    .map_err(|_| ReadError::MalformedData("bad range record array"))?;
                Ok(Self::Format2(CoverageFormat2 { range_records }))
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

impl RangeRecord {
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id.get()
    }

    pub fn end_glyph_id(&self) -> GlyphId16 {
        self.end_glyph_id.get()
    }

    pub fn start_coverage_index(&self) -> u16 {
        self.start_coverage_index.get()
    }

    fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        (self.start_glyph_id().to_u16()..=self.end_glyph_id().to_u16()).map(GlyphId16::new)
    }
}

impl CoverageTable<'_> {
    /// The coverage index for this glyph, if it is covered.
    ///
    /// Glyph ids that do not fit in 16 bits are never covered.
    pub fn get(&self, gid: impl Into<GlyphId>) -> Option<u16> {
        let gid = GlyphId16::try_from(gid.into()).ok()?;
        match self {
            CoverageTable::Format1(t) => t
                .glyph_array
                .binary_search_by(|g| g.get().cmp(&gid))
                .ok()
                .map(|ix| ix as u16),
            CoverageTable::Format2(t) => {
                let ix = t
                    .range_records
                    .binary_search_by(|rec| {
                        if rec.end_glyph_id() < gid {
                            std::cmp::Ordering::Less
                        } else if rec.start_glyph_id() > gid {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    })
                    .ok()?;
                let rec = &t.range_records[ix];
                rec.start_coverage_index()
                    .checked_add(gid.to_u16() - rec.start_glyph_id().to_u16())
            }
        }
    }

    /// The number of covered glyphs.
    pub fn population(&self) -> usize {
        match self {
            CoverageTable::Format1(t) => t.glyph_array.len(),
            CoverageTable::Format2(t) => t
                .range_records
                .iter()
                .map(|rec| {
                    (rec.end_glyph_id().to_u16() as usize + 1)
                        .saturating_sub(rec.start_glyph_id().to_u16() as usize)
                })
                .sum(),
        }
    }

    /// Iterate over the covered glyphs, in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match self {
            CoverageTable::Format1(t) => (Some(t.glyph_array.iter().map(|g| g.get())), None),
            CoverageTable::Format2(t) => {
                let iter = t.range_records.iter().flat_map(RangeRecord::iter);
                (None, Some(iter))
            }
        };

        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }
}
