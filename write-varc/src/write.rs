use crate::error::Error;
use crate::graph::{Graph, ObjectId, ObjectStore};
use crate::validate::Validate;
use varc_types::{F2Dot14, F4Dot12, F6Dot10, FWord, GlyphId16, Uint24};

/// A type that that can be written out as part of a font table.
///
/// This both handles writing big-endian bytes as well as describing the
/// relationship between tables and their subtables.
pub trait FontWrite {
    /// Write our data and information about offsets into this [TableWriter].
    fn write_into(&self, writer: &mut TableWriter);
}

/// An object that manages a collection of serialized tables.
///
/// This handles deduplicating objects and tracking offsets.
#[derive(Debug)]
pub struct TableWriter {
    /// Finished tables, associated with an ObjectId; duplicate tables share an id.
    tables: ObjectStore,
    /// Tables currently being written.
    ///
    /// Tables are processed as they are encountered (as subtables)
    stack: Vec<TableData>,
}

/// Attempt to serialize a table.
///
/// The table is validated first; subtables written with
/// [`TableWriter::write_offset32`] are placed after their parents, with
/// identical subtables written once.
pub fn dump_table<T: FontWrite + Validate>(table: &T) -> Result<Vec<u8>, Error> {
    table.validate()?;
    let mut writer = TableWriter::default();
    table.write_into(&mut writer);
    let mut graph = writer.finish();
    graph.topological_sort();
    graph
        .serialize()
        .ok_or(Error::InvalidInput("offset does not fit in 32 bits"))
}

impl TableWriter {
    fn add_table(&mut self, table: &dyn FontWrite) -> ObjectId {
        self.stack.push(TableData::default());
        table.write_into(self);
        let data = self.stack.pop().unwrap_or_default();
        self.tables.add(data)
    }

    /// Finish this table, returning an object graph.
    fn finish(mut self) -> Graph {
        let data = self.stack.pop().unwrap_or_default();
        let id = self.tables.add(data);
        Graph::from_obj_store(self.tables, id)
    }

    fn current(&mut self) -> &mut TableData {
        if self.stack.is_empty() {
            self.stack.push(TableData::default());
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Write raw bytes into this table.
    ///
    /// The caller is responsible for ensuring bytes are in big-endian order.
    #[inline]
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.current().bytes.extend_from_slice(bytes)
    }

    /// Create a 32-bit offset to another table.
    ///
    /// The provided table will be serialized immediately, and the position
    /// of the offset within the current table will be recorded. Offsets
    /// are resolved when the root table object is serialized.
    pub fn write_offset32(&mut self, obj: &dyn FontWrite) {
        let obj_id = self.add_table(obj);
        self.current().add_offset(obj_id);
    }

    /// Write an optional 32-bit offset; `None` is written as zero.
    pub fn write_nullable_offset32(&mut self, obj: Option<&dyn FontWrite>) {
        match obj {
            Some(obj) => self.write_offset32(obj),
            None => 0u32.write_into(self),
        }
    }

    /// The bytes written so far into the current table.
    ///
    /// Only meaningful for tables without offsets.
    pub(crate) fn into_bytes(mut self) -> Vec<u8> {
        debug_assert_eq!(self.stack.len(), 1);
        self.stack.pop().map(|data| data.bytes).unwrap_or_default()
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        TableWriter {
            tables: ObjectStore::default(),
            stack: vec![TableData::default()],
        }
    }
}

/// The encoded data for a given table, along with info on included offsets
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub(crate) struct TableData {
    pub(crate) bytes: Vec<u8>,
    pub(crate) offsets: Vec<OffsetRecord>,
}

/// The position of a 32-bit offset, along with the id of the pointed-to entity
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct OffsetRecord {
    /// the position of the offset within the parent table
    pub(crate) pos: u32,
    /// The object pointed to by the offset
    pub(crate) object: ObjectId,
}

impl TableData {
    pub(crate) fn add_offset(&mut self, object: ObjectId) {
        self.offsets.push(OffsetRecord {
            pos: self.bytes.len() as u32,
            object,
        });
        self.bytes.extend([0u8; 4]);
    }
}

/// Serialize a table that contains no offsets.
pub(crate) fn to_bytes(table: &impl FontWrite) -> Vec<u8> {
    let mut writer = TableWriter::default();
    table.write_into(&mut writer);
    writer.into_bytes()
}

macro_rules! write_be_bytes {
    ($ty:ty) => {
        impl FontWrite for $ty {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_slice(&self.to_be_bytes())
            }
        }
    };
}

//NOTE: not implemented for offsets! it would be too easy to accidentally write them.
write_be_bytes!(u8);
write_be_bytes!(i8);
write_be_bytes!(u16);
write_be_bytes!(i16);
write_be_bytes!(u32);
write_be_bytes!(i32);
write_be_bytes!(Uint24);
write_be_bytes!(F2Dot14);
write_be_bytes!(F4Dot12);
write_be_bytes!(F6Dot10);
write_be_bytes!(GlyphId16);

impl FontWrite for FWord {
    #[inline]
    fn write_into(&self, writer: &mut TableWriter) {
        self.to_i16().write_into(writer)
    }
}

impl<T: FontWrite> FontWrite for [T] {
    fn write_into(&self, writer: &mut TableWriter) {
        self.iter().for_each(|item| item.write_into(writer))
    }
}

impl<T: FontWrite> FontWrite for Vec<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        self.as_slice().write_into(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationCtx;

    struct Leaf(u16);

    impl FontWrite for Leaf {
        fn write_into(&self, writer: &mut TableWriter) {
            self.0.write_into(writer)
        }
    }

    struct Root {
        first: Leaf,
        second: Leaf,
        missing: Option<Leaf>,
    }

    impl FontWrite for Root {
        fn write_into(&self, writer: &mut TableWriter) {
            0xfeedu16.write_into(writer);
            writer.write_offset32(&self.first);
            writer.write_offset32(&self.second);
            writer.write_nullable_offset32(self.missing.as_ref().map(|l| l as &dyn FontWrite));
        }
    }

    impl Validate for Root {
        fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
    }

    #[test]
    fn offsets_resolved() {
        let root = Root {
            first: Leaf(1),
            second: Leaf(2),
            missing: None,
        };
        let bytes = dump_table(&root).unwrap();
        assert_eq!(
            bytes,
            [0xfe, 0xed, 0, 0, 0, 14, 0, 0, 0, 16, 0, 0, 0, 0, 0, 1, 0, 2]
        );
    }

    #[test]
    fn duplicates_written_once() {
        let root = Root {
            first: Leaf(7),
            second: Leaf(7),
            missing: Some(Leaf(7)),
        };
        let bytes = dump_table(&root).unwrap();
        assert_eq!(
            bytes,
            [0xfe, 0xed, 0, 0, 0, 14, 0, 0, 0, 14, 0, 0, 0, 14, 0, 7]
        );
    }

    #[test]
    fn fixed_types_are_big_endian() {
        let bytes = to_bytes(&vec![F2Dot14::from_f32(-1.0)]);
        assert_eq!(bytes, [0xc0, 0x00]);
        assert_eq!(to_bytes(&F6Dot10::from_f32(1.5)), [0x06, 0x00]);
        assert_eq!(to_bytes(&FWord::new(-2)), [0xff, 0xfe]);
        assert_eq!(to_bytes(&Uint24::new(0x123456)), [0x12, 0x34, 0x56]);
    }
}
