//! Traits for interpreting table data

use crate::font_data::FontData;

/// A type that can be read from raw table data.
///
/// This trait is implemented for all structures that are self-describing: that
/// is, structures that do not require any external state in order to interpret
/// their underlying bytes.
pub trait FontRead<'a>: Sized {
    /// Read an instance of `Self` from the provided data, performing validation.
    ///
    /// This method is responsible for ensuring the input data is consistent:
    /// that header fields have supported values, and that any array lengths
    /// are not out-of-bounds.
    fn read(data: FontData<'a>) -> Result<Self, ReadError>;
}

/// An error that occurs when reading table data
///
/// Offsets carried by the variants are absolute: they are measured from the
/// start of the buffer passed to [`FontData::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The buffer is shorter than a field demands.
    TruncatedInput(u32),
    /// A packed tuple run extends past the end of its data.
    ///
    /// The value is the offset of the offending control byte.
    MalformedTuple(u32),
    /// A component record is internally inconsistent.
    MalformedComponent(&'static str),
    /// The offsets of an index are zero, not monotonic, or point past the data.
    ///
    /// The value is the index of the item whose offsets are corrupt.
    CorruptOffsets(u32),
    /// An item was requested past the end of an index.
    IndexOutOfRange { index: u32, count: u32 },
    /// A variation index does not address an existing delta set.
    InvalidVarIdx(u32),
    /// A delta set has a different number of values than the caller expects.
    TupleWidthMismatch {
        var_idx: u32,
        expected: usize,
        actual: usize,
    },
    // i64 is flexible enough to store any value we might encounter
    InvalidFormat(i64),
    NullOffset,
    MalformedData(&'static str),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadError::TruncatedInput(pos) => write!(f, "Unexpected end of data at offset {pos}"),
            ReadError::MalformedTuple(pos) => {
                write!(f, "Malformed packed tuple run at offset {pos}")
            }
            ReadError::MalformedComponent(msg) => write!(f, "Malformed component: '{msg}'"),
            ReadError::CorruptOffsets(ix) => write!(f, "Corrupt offsets for index item {ix}"),
            ReadError::IndexOutOfRange { index, count } => {
                write!(f, "Index {index} out of range for {count} items")
            }
            ReadError::InvalidVarIdx(var_idx) => {
                write!(f, "Invalid variation index 0x{var_idx:08X}")
            }
            ReadError::TupleWidthMismatch {
                var_idx,
                expected,
                actual,
            } => write!(
                f,
                "Delta set 0x{var_idx:08X} has {actual} values, expected {expected}"
            ),
            ReadError::InvalidFormat(x) => write!(f, "Invalid format '{x}'"),
            ReadError::NullOffset => write!(f, "An offset was unexpectedly null"),
            ReadError::MalformedData(msg) => write!(f, "Malformed data: '{msg}'"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}
