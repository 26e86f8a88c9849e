//! Coverage tables
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table>

use varc_types::GlyphId16;

use crate::{
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// A coverage table, in either format.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoverageTable {
    Format1(CoverageFormat1),
    Format2(CoverageFormat2),
}

/// Coverage format 1: an array of glyph ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CoverageFormat1 {
    pub glyph_array: Vec<GlyphId16>,
}

/// Coverage format 2: ranges of glyph ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CoverageFormat2 {
    pub range_records: Vec<RangeRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeRecord {
    pub start_glyph_id: GlyphId16,
    pub end_glyph_id: GlyphId16,
    pub start_coverage_index: u16,
}

impl CoverageTable {
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        let (one, two) = match self {
            Self::Format1(table) => (Some(table.glyph_array.iter().copied()), None),
            Self::Format2(table) => (
                None,
                Some(table.range_records.iter().flat_map(|rcd| {
                    (rcd.start_glyph_id.to_u16()..=rcd.end_glyph_id.to_u16()).map(GlyphId16::new)
                })),
            ),
        };

        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Validate for CoverageTable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("CoverageTable", |ctx| {
            let count = match self {
                Self::Format1(table) => table.glyph_array.len(),
                Self::Format2(table) => table.range_records.len(),
            };
            if count > u16::MAX as usize {
                ctx.report("too many items for a u16 count");
            }
        })
    }
}

impl FontWrite for CoverageTable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => {
                1u16.write_into(writer);
                (table.glyph_array.len() as u16).write_into(writer);
                table.glyph_array.write_into(writer);
            }
            Self::Format2(table) => {
                2u16.write_into(writer);
                (table.range_records.len() as u16).write_into(writer);
                table.range_records.write_into(writer);
            }
        }
    }
}

impl FontWrite for RangeRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.write_into(writer);
        self.end_glyph_id.write_into(writer);
        self.start_coverage_index.write_into(writer);
    }
}

/// A builder for [CoverageTable] tables.
///
/// This will choose the smaller format for the included glyphs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageTableBuilder {
    // invariant: is always sorted
    glyphs: Vec<GlyphId16>,
}

impl FromIterator<GlyphId16> for CoverageTableBuilder {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        let glyphs = iter.into_iter().collect::<Vec<_>>();
        CoverageTableBuilder::from_glyphs(glyphs)
    }
}

impl FromIterator<GlyphId16> for CoverageTable {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        iter.into_iter().collect::<CoverageTableBuilder>().build()
    }
}

impl CoverageTableBuilder {
    /// Create a new builder from a vec of glyph ids.
    pub fn from_glyphs(mut glyphs: Vec<GlyphId16>) -> Self {
        glyphs.sort_unstable();
        glyphs.dedup();
        CoverageTableBuilder { glyphs }
    }

    /// Add a glyph to this coverage table, returning its coverage index.
    ///
    /// If the glyph already exists, this returns its current index. Indices
    /// of glyphs sorted after it shift up by one.
    pub fn add(&mut self, glyph: GlyphId16) -> usize {
        match self.glyphs.binary_search(&glyph) {
            Ok(ix) => ix,
            Err(ix) => {
                self.glyphs.insert(ix, glyph);
                ix
            }
        }
    }

    /// The glyphs in coverage index order.
    pub fn glyphs(&self) -> &[GlyphId16] {
        &self.glyphs
    }

    /// Convert this builder into the appropriate [CoverageTable] variant.
    pub fn build(self) -> CoverageTable {
        let ranges = iter_ranges(&self.glyphs).count();
        let format2_len = 4 + ranges * 6;
        let format1_len = 4 + self.glyphs.len() * 2;
        if format2_len < format1_len {
            CoverageTable::Format2(CoverageFormat2 {
                range_records: iter_ranges(&self.glyphs).collect(),
            })
        } else {
            CoverageTable::Format1(CoverageFormat1 {
                glyph_array: self.glyphs,
            })
        }
    }
}

/// Records for runs of consecutive glyphs in a sorted slice.
fn iter_ranges(glyphs: &[GlyphId16]) -> impl Iterator<Item = RangeRecord> + '_ {
    let mut rest = glyphs;
    let mut coverage_index = 0usize;
    std::iter::from_fn(move || {
        let first = *rest.first()?;
        let run_len = rest
            .windows(2)
            .take_while(|pair| pair[1].to_u16().checked_sub(pair[0].to_u16()) == Some(1))
            .count()
            + 1;
        let record = RangeRecord {
            start_glyph_id: first,
            end_glyph_id: rest[run_len - 1],
            start_coverage_index: coverage_index as u16,
        };
        coverage_index += run_len;
        rest = &rest[run_len..];
        Some(record)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump_table;
    use read_varc::{tables::coverage::CoverageTable as ReadCoverage, FontData, FontRead};

    fn make_glyph_vec<const N: usize>(gids: [u16; N]) -> Vec<GlyphId16> {
        gids.into_iter().map(GlyphId16::new).collect()
    }

    #[test]
    fn coverage_builder() {
        let coverage = make_glyph_vec([1u16, 2, 9, 3, 6, 9])
            .into_iter()
            .collect::<CoverageTableBuilder>();
        assert_eq!(coverage.glyphs, make_glyph_vec([1, 2, 3, 6, 9]));
    }

    #[test]
    fn sparse_glyphs_use_format1() {
        let coverage: CoverageTable = make_glyph_vec([3, 7, 20]).into_iter().collect();
        assert!(matches!(coverage, CoverageTable::Format1(_)));
        let bytes = dump_table(&coverage).unwrap();
        assert_eq!(bytes, [0, 1, 0, 3, 0, 3, 0, 7, 0, 20]);
    }

    #[test]
    fn dense_glyphs_use_format2() {
        let glyphs = make_glyph_vec([10, 11, 12, 13, 14, 30, 31, 32]);
        let coverage: CoverageTable = glyphs.iter().copied().collect();
        let CoverageTable::Format2(table) = &coverage else {
            panic!("expected format 2");
        };
        assert_eq!(
            table.range_records,
            [
                RangeRecord {
                    start_glyph_id: GlyphId16::new(10),
                    end_glyph_id: GlyphId16::new(14),
                    start_coverage_index: 0,
                },
                RangeRecord {
                    start_glyph_id: GlyphId16::new(30),
                    end_glyph_id: GlyphId16::new(32),
                    start_coverage_index: 5,
                },
            ]
        );
        assert_eq!(coverage.iter().collect::<Vec<_>>(), glyphs);

        let bytes = dump_table(&coverage).unwrap();
        let read = ReadCoverage::read(FontData::new(&bytes)).unwrap();
        for (i, gid) in glyphs.iter().enumerate() {
            assert_eq!(read.get(*gid), Some(i as u16));
        }
        assert_eq!(read.get(GlyphId16::new(15)), None);
    }

    #[test]
    fn add_returns_index() {
        let mut builder = CoverageTableBuilder::from_glyphs(make_glyph_vec([5, 9]));
        assert_eq!(builder.add(GlyphId16::new(9)), 1);
        assert_eq!(builder.add(GlyphId16::new(7)), 1);
        assert_eq!(builder.glyphs(), make_glyph_vec([5, 7, 9]));
    }
}
