//! Indices of variable sized items

use varc_types::Uint24;

use crate::{
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// An index of byte strings with a 32-bit count, in the layout of the CFF2
/// [INDEX] structure.
///
/// The offset size is the smallest that can address all of the data. An
/// empty index is written as a bare zero count.
///
/// [INDEX]: https://learn.microsoft.com/en-us/typography/opentype/spec/cff2#5-index-data
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Index2 {
    items: Vec<Vec<u8>>,
}

impl Index2 {
    pub fn from_items(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }

    /// The number of items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Vec<u8>] {
        &self.items
    }

    /// The size of each offset, in bytes.
    pub fn off_size(&self) -> u8 {
        let last_offset = self.data_len().saturating_add(1);
        (4 - (last_offset.min(u32::MAX as usize) as u32).leading_zeros() / 8).max(1) as u8
    }

    fn data_len(&self) -> usize {
        self.items.iter().map(Vec::len).sum()
    }
}

impl Validate for Index2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Index2", |ctx| {
            if self.items.len() > u32::MAX as usize {
                ctx.in_field("count", |ctx| ctx.report("too many items"));
            }
            if self.data_len() >= u32::MAX as usize {
                ctx.in_field("data", |ctx| ctx.report("data too large for 32-bit offsets"));
            }
        })
    }
}

impl FontWrite for Index2 {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.items.len() as u32).write_into(writer);
        if self.items.is_empty() {
            return;
        }
        let off_size = self.off_size();
        off_size.write_into(writer);

        // offsets are relative to the byte before the data, so start at 1
        let mut offset = 1u32;
        let offsets = std::iter::once(offset).chain(self.items.iter().map(|item| {
            offset += item.len() as u32;
            offset
        }));
        for offset in offsets {
            match off_size {
                1 => (offset as u8).write_into(writer),
                2 => (offset as u16).write_into(writer),
                3 => Uint24::new(offset).write_into(writer),
                _ => offset.write_into(writer),
            }
        }

        for item in &self.items {
            writer.write_slice(item);
        }
    }
}
