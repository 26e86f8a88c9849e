//! The [VARC (Variable Composite/Component)](https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md) table

use alloc::vec::Vec;

use types::{F2Dot14, F4Dot12, F6Dot10, FWord, GlyphId, Uint24};

use super::{
    coverage::CoverageTable,
    index::{Index2, Index2Of},
    mivs::MultiItemVariationStore,
    variations::TupleValues,
};
use crate::{Cursor, FontData, FontRead, ReadError};

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::*;

/// The `VARC` table.
///
/// Maps covered glyphs to records of variable components.
#[derive(Clone, Debug)]
pub struct Varc<'a> {
    data: FontData<'a>,
    minor_version: u16,
    coverage_offset: u32,
    var_store_offset: u32,
    glyph_records_offset: u32,
}

impl<'a> FontRead<'a> for Varc<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let major_version: u16 = cursor.read()?;
        if major_version != 1 {
            return Err(ReadError::InvalidFormat(major_version as _));
        }
        let minor_version = cursor.read()?;
        let coverage_offset = cursor.read()?;
        let var_store_offset = cursor.read()?;
        let glyph_records_offset = cursor.read()?;
        Ok(Self {
            data,
            minor_version,
            coverage_offset,
            var_store_offset,
            glyph_records_offset,
        })
    }
}

impl<'a> Varc<'a> {
    /// The major and minor version of the table.
    pub fn version(&self) -> (u16, u16) {
        (1, self.minor_version)
    }

    /// The set of glyphs that have a variable composite definition.
    ///
    /// The coverage index of a glyph is the index of its record in
    /// [`Self::glyph_records`].
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.subtable(self.coverage_offset)
    }

    /// The variation store, if present.
    pub fn var_store(&self) -> Option<Result<MultiItemVariationStore<'a>, ReadError>> {
        (self.var_store_offset != 0).then(|| self.subtable(self.var_store_offset))
    }

    /// The composite glyph records, ordered by coverage index.
    pub fn glyph_records(&self) -> Result<Index2Of<'a, CompositeGlyph<'a>>, ReadError> {
        self.subtable(self.glyph_records_offset)
    }

    /// The record for the glyph with coverage index `nth`.
    pub fn glyph(&self, nth: usize) -> Result<CompositeGlyph<'a>, ReadError> {
        self.glyph_records()?.get(nth)
    }

    fn subtable<T: FontRead<'a>>(&self, offset: u32) -> Result<T, ReadError> {
        if offset == 0 {
            return Err(ReadError::NullOffset);
        }
        self.data.read_subtable(offset as usize)
    }
}

/// A VARC glyph doesn't have any root level attributes, it's just a list of components
///
/// <https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md#variable-composite-description>
#[derive(Clone, Debug)]
pub struct CompositeGlyph<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for CompositeGlyph<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(Self { data })
    }
}

impl<'a> CompositeGlyph<'a> {
    /// Iterate over the components of this glyph.
    ///
    /// Components are stored back to back, so the first error ends the
    /// iteration. With `strict`, components with the reserved flag bit set
    /// are rejected.
    pub fn components<'r, R: AxisIndexResolver + ?Sized>(
        &self,
        axis_indices: &'r R,
        strict: bool,
    ) -> Components<'a, 'r, R> {
        Components {
            cursor: self.data.cursor(),
            axis_indices,
            strict,
            done: false,
        }
    }

    /// The raw bytes of the record.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// An iterator over the components of a [`CompositeGlyph`].
pub struct Components<'a, 'r, R: ?Sized> {
    cursor: Cursor<'a>,
    axis_indices: &'r R,
    strict: bool,
    done: bool,
}

impl<'a, R: AxisIndexResolver + ?Sized> Iterator for Components<'a, '_, R> {
    type Item = Result<VarComponent<'a>, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_empty() {
            return None;
        }
        let result = VarComponent::parse(&mut self.cursor, self.axis_indices, self.strict);
        self.done = result.is_err();
        Some(result)
    }
}

/// Access to the shared lists of axis indices that components refer to.
///
/// A component with [`VarcFlags::HAVE_AXES`] names one of these lists; the
/// list determines how many axis values the component stores, and which
/// axes they apply to.
pub trait AxisIndexResolver {
    /// Returns the axis indices for the list at `index`.
    fn axis_indices(&self, index: u32) -> Result<&[u16], ReadError>;
}

impl AxisIndexResolver for [Vec<u16>] {
    fn axis_indices(&self, index: u32) -> Result<&[u16], ReadError> {
        self.get(index as usize)
            .map(Vec::as_slice)
            .ok_or(ReadError::IndexOutOfRange {
                index,
                count: self.len().min(u32::MAX as usize) as u32,
            })
    }
}

impl AxisIndexResolver for Vec<Vec<u16>> {
    fn axis_indices(&self, index: u32) -> Result<&[u16], ReadError> {
        self.as_slice().axis_indices(index)
    }
}

/// Axis index lists decoded from an [`Index2`] of packed tuples.
///
/// The lists are decoded once, when read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisIndicesList {
    lists: Vec<Vec<u16>>,
}

impl AxisIndicesList {
    pub fn new(lists: Vec<Vec<u16>>) -> Self {
        Self { lists }
    }

    /// The number of lists.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl<'a> FontRead<'a> for AxisIndicesList {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let index = Index2::read(data)?;
        let lists = index
            .iter()
            .map(|item| {
                let item = item?;
                TupleValues::read_to_end(item)?
                    .iter()
                    .map(|value| {
                        u16::try_from(value).map_err(|_| ReadError::MalformedTuple(item.position()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lists })
    }
}

impl AxisIndexResolver for AxisIndicesList {
    fn axis_indices(&self, index: u32) -> Result<&[u16], ReadError> {
        self.lists.axis_indices(index)
    }
}

/// Flags for a [`VarComponent`].
///
/// The transform flags are listed in the order their fields are stored.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, bytemuck_derive::AnyBitPattern)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct VarcFlags {
    bits: u16,
}

impl VarcFlags {
    /// Advance width and side bearings come from this component.
    pub const USE_MY_METRICS: Self = Self { bits: 0x0001 };
    /// Axes not named by this component are reset to their defaults.
    pub const RESET_UNSPECIFIED_AXES: Self = Self { bits: 0x0002 };
    pub const GID_IS_24BIT: Self = Self { bits: 0x0004 };
    pub const HAVE_AXES: Self = Self { bits: 0x0008 };
    pub const AXIS_VALUES_HAVE_VARIATION: Self = Self { bits: 0x0010 };
    pub const TRANSFORM_HAS_VARIATION: Self = Self { bits: 0x0020 };
    pub const HAVE_TRANSLATE_X: Self = Self { bits: 0x0040 };
    pub const HAVE_TRANSLATE_Y: Self = Self { bits: 0x0080 };
    pub const HAVE_ROTATION: Self = Self { bits: 0x0100 };
    pub const HAVE_SCALE_X: Self = Self { bits: 0x0200 };
    pub const HAVE_SCALE_Y: Self = Self { bits: 0x0400 };
    pub const HAVE_SKEW_X: Self = Self { bits: 0x0800 };
    pub const HAVE_SKEW_Y: Self = Self { bits: 0x1000 };
    pub const HAVE_TCENTER_X: Self = Self { bits: 0x2000 };
    pub const HAVE_TCENTER_Y: Self = Self { bits: 0x4000 };

    /// The reserved bit, which must be zero.
    ///
    /// This is not a member of [`Self::all`].
    pub const RESERVED_MASK: u16 = 0x8000;

    const TRANSFORM_MASK: u16 = 0x7FC0;
}

// most of this impl is taken from the bitflags crate, under the MIT/Apache license
// https://docs.rs/bitflags/latest/bitflags/
impl VarcFlags {
    ///  Returns an empty set of flags.
    #[inline]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Returns the set containing all flags.
    #[inline]
    pub const fn all() -> Self {
        Self {
            bits: !Self::RESERVED_MASK,
        }
    }

    /// Returns the raw value of the flags currently stored.
    #[inline]
    pub const fn bits(&self) -> u16 {
        self.bits
    }

    /// Convert from underlying bit representation, unless that
    /// representation contains bits that do not correspond to a flag.
    #[inline]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if (bits & !Self::all().bits()) == 0 {
            Some(Self { bits })
        } else {
            None
        }
    }

    /// Convert from underlying bit representation, dropping any bits
    /// that do not correspond to flags.
    #[inline]
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self {
            bits: bits & Self::all().bits,
        }
    }

    /// Returns `true` if no flags are currently stored.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits() == Self::empty().bits()
    }

    /// Returns `true` if there are flags common to both `self` and `other`.
    #[inline]
    pub const fn intersects(&self, other: Self) -> bool {
        !(Self {
            bits: self.bits & other.bits,
        })
        .is_empty()
    }

    /// Returns `true` if all of the flags in `other` are contained within `self`.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Inserts the specified flags in-place.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.bits |= other.bits;
    }

    /// Removes the specified flags in-place.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.bits &= !other.bits;
    }

    /// Inserts or removes the specified flags depending on the passed value.
    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Returns the union of between the flags in `self` and `other`.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// The transform fields present in a component with these flags, in
    /// storage order.
    pub fn transform_fields(self) -> impl Iterator<Item = TransformField> + Clone {
        TransformField::ALL
            .into_iter()
            .filter(move |field| self.contains(field.flag()))
    }

    /// The number of transform fields present.
    pub const fn transform_field_count(self) -> usize {
        (self.bits & Self::TRANSFORM_MASK).count_ones() as usize
    }
}

impl std::ops::BitOr for VarcFlags {
    type Output = Self;

    /// Returns the union of the two sets of flags.
    #[inline]
    fn bitor(self, other: VarcFlags) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

impl std::ops::BitOrAssign for VarcFlags {
    /// Adds the set of flags.
    #[inline]
    fn bitor_assign(&mut self, other: Self) {
        self.bits |= other.bits;
    }
}

impl std::ops::BitAnd for VarcFlags {
    type Output = Self;

    /// Returns the intersection between the two sets of flags.
    #[inline]
    fn bitand(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }
}

impl std::fmt::Debug for VarcFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let members: &[(&str, Self)] = &[
            ("USE_MY_METRICS", Self::USE_MY_METRICS),
            ("RESET_UNSPECIFIED_AXES", Self::RESET_UNSPECIFIED_AXES),
            ("GID_IS_24BIT", Self::GID_IS_24BIT),
            ("HAVE_AXES", Self::HAVE_AXES),
            ("AXIS_VALUES_HAVE_VARIATION", Self::AXIS_VALUES_HAVE_VARIATION),
            ("TRANSFORM_HAS_VARIATION", Self::TRANSFORM_HAS_VARIATION),
            ("HAVE_TRANSLATE_X", Self::HAVE_TRANSLATE_X),
            ("HAVE_TRANSLATE_Y", Self::HAVE_TRANSLATE_Y),
            ("HAVE_ROTATION", Self::HAVE_ROTATION),
            ("HAVE_SCALE_X", Self::HAVE_SCALE_X),
            ("HAVE_SCALE_Y", Self::HAVE_SCALE_Y),
            ("HAVE_SKEW_X", Self::HAVE_SKEW_X),
            ("HAVE_SKEW_Y", Self::HAVE_SKEW_Y),
            ("HAVE_TCENTER_X", Self::HAVE_TCENTER_X),
            ("HAVE_TCENTER_Y", Self::HAVE_TCENTER_Y),
        ];
        let mut first = true;
        for (name, value) in members {
            if self.contains(*value) {
                if !first {
                    f.write_str(" | ")?;
                }
                first = false;
                f.write_str(name)?;
            }
        }
        if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}

/// One of the nine optional transform fields of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformField {
    TranslateX,
    TranslateY,
    Rotation,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
    CenterX,
    CenterY,
}

impl TransformField {
    /// All fields, in storage order.
    pub const ALL: [TransformField; 9] = [
        TransformField::TranslateX,
        TransformField::TranslateY,
        TransformField::Rotation,
        TransformField::ScaleX,
        TransformField::ScaleY,
        TransformField::SkewX,
        TransformField::SkewY,
        TransformField::CenterX,
        TransformField::CenterY,
    ];

    /// The flag that marks this field as present.
    pub const fn flag(self) -> VarcFlags {
        match self {
            TransformField::TranslateX => VarcFlags::HAVE_TRANSLATE_X,
            TransformField::TranslateY => VarcFlags::HAVE_TRANSLATE_Y,
            TransformField::Rotation => VarcFlags::HAVE_ROTATION,
            TransformField::ScaleX => VarcFlags::HAVE_SCALE_X,
            TransformField::ScaleY => VarcFlags::HAVE_SCALE_Y,
            TransformField::SkewX => VarcFlags::HAVE_SKEW_X,
            TransformField::SkewY => VarcFlags::HAVE_SKEW_Y,
            TransformField::CenterX => VarcFlags::HAVE_TCENTER_X,
            TransformField::CenterY => VarcFlags::HAVE_TCENTER_Y,
        }
    }

    /// The number of stored units in one unit of the field's value.
    ///
    /// Variation deltas for a field are in stored units.
    pub const fn units_per_one(self) -> f32 {
        match self {
            TransformField::Rotation | TransformField::SkewX | TransformField::SkewY => 4096.0,
            TransformField::ScaleX | TransformField::ScaleY => 1024.0,
            _ => 1.0,
        }
    }

    fn read(self, cursor: &mut Cursor) -> Result<f32, ReadError> {
        Ok(match self {
            TransformField::Rotation | TransformField::SkewX | TransformField::SkewY => {
                cursor.read::<F4Dot12>()?.to_f32()
            }
            TransformField::ScaleX | TransformField::ScaleY => cursor.read::<F6Dot10>()?.to_f32(),
            _ => cursor.read::<FWord>()?.to_i16() as f32,
        })
    }
}

/// A single variable component of a [`CompositeGlyph`].
///
/// <https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md#variable-component-record>
#[derive(Clone, Debug)]
pub struct VarComponent<'a> {
    flags: VarcFlags,
    gid: GlyphId,
    axis_indices_index: Option<u32>,
    axis_values: Option<TupleValues<'a>>,
    axis_values_var_index: Option<u32>,
    transform_var_index: Option<u32>,
    transform: DecomposedTransform,
}

impl<'a> VarComponent<'a> {
    /// Read one component from the start of `data`, returning it along with
    /// the number of bytes it occupies.
    pub fn read<R: AxisIndexResolver + ?Sized>(
        data: FontData<'a>,
        axis_indices: &R,
        strict: bool,
    ) -> Result<(Self, usize), ReadError> {
        let mut cursor = data.cursor();
        let component = Self::parse(&mut cursor, axis_indices, strict)?;
        Ok((component, cursor.position()))
    }

    fn parse<R: AxisIndexResolver + ?Sized>(
        cursor: &mut Cursor<'a>,
        axis_indices: &R,
        strict: bool,
    ) -> Result<Self, ReadError> {
        Self::parse_fields(cursor, axis_indices, strict).map_err(|e| match e {
            ReadError::TruncatedInput(_) => {
                ReadError::MalformedComponent("field extends past the end of the record")
            }
            e => e,
        })
    }

    fn parse_fields<R: AxisIndexResolver + ?Sized>(
        cursor: &mut Cursor<'a>,
        axis_indices: &R,
        strict: bool,
    ) -> Result<Self, ReadError> {
        let raw_flags: u16 = cursor.read()?;
        if strict && raw_flags & VarcFlags::RESERVED_MASK != 0 {
            return Err(ReadError::MalformedComponent("reserved flag bit is set"));
        }
        let flags = VarcFlags::from_bits_truncate(raw_flags);
        if flags.contains(VarcFlags::AXIS_VALUES_HAVE_VARIATION)
            && !flags.contains(VarcFlags::HAVE_AXES)
        {
            return Err(ReadError::MalformedComponent(
                "axis value variations without axis values",
            ));
        }

        let gid = if flags.contains(VarcFlags::GID_IS_24BIT) {
            GlyphId::from(cursor.read::<Uint24>()?)
        } else {
            GlyphId::from(cursor.read::<u16>()?)
        };

        let (axis_indices_index, axis_values) = if flags.contains(VarcFlags::HAVE_AXES) {
            let axis_indices_index = cursor.read_u32_var()?;
            let count = axis_indices.axis_indices(axis_indices_index)?.len();
            let data = cursor.remaining().unwrap_or_default();
            let values = TupleValues::read(data, count)?;
            cursor.advance_by(values.byte_len());
            (Some(axis_indices_index), Some(values))
        } else {
            (None, None)
        };

        let axis_values_var_index = flags
            .contains(VarcFlags::AXIS_VALUES_HAVE_VARIATION)
            .then(|| cursor.read_u32_var())
            .transpose()?;
        let transform_var_index = flags
            .contains(VarcFlags::TRANSFORM_HAS_VARIATION)
            .then(|| cursor.read_u32_var())
            .transpose()?;

        let mut transform = DecomposedTransform::default();
        for field in flags.transform_fields() {
            transform.set(field, field.read(cursor)?);
        }
        if !flags.contains(VarcFlags::HAVE_SCALE_Y) {
            transform.scale_y = transform.scale_x;
        }

        Ok(VarComponent {
            flags,
            gid,
            axis_indices_index,
            axis_values,
            axis_values_var_index,
            transform_var_index,
            transform,
        })
    }

    pub fn flags(&self) -> VarcFlags {
        self.flags
    }

    pub fn gid(&self) -> GlyphId {
        self.gid
    }

    pub fn axis_indices_index(&self) -> Option<u32> {
        self.axis_indices_index
    }

    /// The explicit axis values, in raw `F2Dot14` units.
    pub fn axis_values(&self) -> Option<&TupleValues<'a>> {
        self.axis_values.as_ref()
    }

    pub fn axis_values_var_index(&self) -> Option<u32> {
        self.axis_values_var_index
    }

    pub fn transform_var_index(&self) -> Option<u32> {
        self.transform_var_index
    }

    /// The stored transform, with absent fields at their defaults.
    pub fn transform(&self) -> &DecomposedTransform {
        &self.transform
    }
}

/// <https://github.com/fonttools/fonttools/blob/5e6b12d12fa08abafbeb7570f47707fbedf69a45/Lib/fontTools/misc/transform.py#L410>
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecomposedTransform {
    translate_x: f32,
    translate_y: f32,
    rotation: f32, // multiples of Pi, counter-clockwise
    scale_x: f32,
    scale_y: f32,
    skew_x: f32, // multiples of Pi, clockwise
    skew_y: f32, // multiples of Pi, counter-clockwise
    center_x: f32,
    center_y: f32,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl DecomposedTransform {
    pub fn translate_x(&self) -> f32 {
        self.translate_x
    }

    pub fn translate_y(&self) -> f32 {
        self.translate_y
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn skew_x(&self) -> f32 {
        self.skew_x
    }

    pub fn skew_y(&self) -> f32 {
        self.skew_y
    }

    pub fn center_x(&self) -> f32 {
        self.center_x
    }

    pub fn center_y(&self) -> f32 {
        self.center_y
    }

    /// Returns the value of a field.
    pub fn get(&self, field: TransformField) -> f32 {
        match field {
            TransformField::TranslateX => self.translate_x,
            TransformField::TranslateY => self.translate_y,
            TransformField::Rotation => self.rotation,
            TransformField::ScaleX => self.scale_x,
            TransformField::ScaleY => self.scale_y,
            TransformField::SkewX => self.skew_x,
            TransformField::SkewY => self.skew_y,
            TransformField::CenterX => self.center_x,
            TransformField::CenterY => self.center_y,
        }
    }

    /// Sets the value of a field.
    pub fn set(&mut self, field: TransformField, value: f32) {
        let slot = match field {
            TransformField::TranslateX => &mut self.translate_x,
            TransformField::TranslateY => &mut self.translate_y,
            TransformField::Rotation => &mut self.rotation,
            TransformField::ScaleX => &mut self.scale_x,
            TransformField::ScaleY => &mut self.scale_y,
            TransformField::SkewX => &mut self.skew_x,
            TransformField::SkewY => &mut self.skew_y,
            TransformField::CenterX => &mut self.center_x,
            TransformField::CenterY => &mut self.center_y,
        };
        *slot = value;
    }

    /// Adds variation deltas to the fields present in `flags`.
    ///
    /// `deltas` are in stored units and ordered like the fields; absent
    /// fields are never varied. Afterwards, if `flags` has no y scale, the y
    /// scale follows the x scale.
    pub fn apply_deltas(&mut self, flags: VarcFlags, deltas: &[f32]) {
        for (field, delta) in flags.transform_fields().zip(deltas) {
            self.set(field, self.get(field) + delta / field.units_per_one());
        }
        if !flags.contains(VarcFlags::HAVE_SCALE_Y) {
            self.scale_y = self.scale_x;
        }
    }

    /// Convert decomposed form to 2x3 matrix form.
    ///
    /// The first two values are x,y x-basis vector,
    /// the second 2 values are x,y y-basis vector, and the third 2 are translation.
    ///
    /// In augmented matrix
    /// form, if this method returns `[a, b, c, d, e, f]` that is taken as:
    ///
    /// ```text
    /// | a c e |
    /// | b d f |
    /// | 0 0 1 |
    /// ```
    ///
    /// References:
    ///   FontTools Python implementation <https://github.com/fonttools/fonttools/blob/5e6b12d12fa08abafbeb7570f47707fbedf69a45/Lib/fontTools/misc/transform.py#L484-L500>
    /// * Wikipedia [affine transformation](https://en.wikipedia.org/wiki/Affine_transformation)
    pub fn matrix(&self) -> [f32; 6] {
        // Python: t.translate(self.translateX + self.tCenterX, self.translateY + self.tCenterY)
        let mut transform = [
            1.0,
            0.0,
            0.0,
            1.0,
            self.translate_x + self.center_x,
            self.translate_y + self.center_y,
        ];

        // Python: t = t.rotate(self.rotation * math.pi)
        if self.rotation != 0.0 {
            let (s, c) = (self.rotation * core::f32::consts::PI).sin_cos();
            transform = mul_matrix(transform, [c, s, -s, c, 0.0, 0.0]);
        }

        // Python: t = t.scale(self.scaleX, self.scaleY)
        if (self.scale_x, self.scale_y) != (1.0, 1.0) {
            transform = mul_matrix(transform, [self.scale_x, 0.0, 0.0, self.scale_y, 0.0, 0.0]);
        }

        // Python: t = t.skew(-self.skewX * math.pi, self.skewY * math.pi)
        if (self.skew_x, self.skew_y) != (0.0, 0.0) {
            let tan_x = (-self.skew_x * core::f32::consts::PI).tan();
            let tan_y = (self.skew_y * core::f32::consts::PI).tan();
            transform = mul_matrix(transform, [1.0, tan_y, tan_x, 1.0, 0.0, 0.0]);
        }

        // Python: t = t.translate(-self.tCenterX, -self.tCenterY)
        if (self.center_x, self.center_y) != (0.0, 0.0) {
            transform = mul_matrix(
                transform,
                [1.0, 0.0, 0.0, 1.0, -self.center_x, -self.center_y],
            );
        }

        transform
    }
}

/// Multiplies two affine matrices, so that `b` is applied first.
pub fn mul_matrix(a: [f32; 6], b: [f32; 6]) -> [f32; 6] {
    [
        a[0] * b[0] + a[2] * b[1],
        a[1] * b[0] + a[3] * b[1],
        a[0] * b[2] + a[2] * b[3],
        a[1] * b[2] + a[3] * b[3],
        a[0] * b[4] + a[2] * b[5] + a[4],
        a[1] * b[4] + a[3] * b[5] + a[5],
    ]
}

/// Converts a blended axis value in raw `F2Dot14` units to a coordinate.
pub fn axis_value_to_coord(value: f32) -> F2Dot14 {
    let raw = value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    F2Dot14::from_bits(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn round6(v: f32) -> f32 {
        (v * 1_000_000.0).round() / 1_000_000.0
    }

    trait Round {
        fn round_for_test(self) -> Self;
    }

    impl Round for [f32; 6] {
        fn round_for_test(self) -> Self {
            self.map(round6)
        }
    }

    fn axis_lists() -> Vec<Vec<u16>> {
        vec![vec![0], vec![0, 3]]
    }

    fn read_component(buf: &BeBuffer, strict: bool) -> Result<(VarComponent, usize), ReadError> {
        VarComponent::read(buf.font_data(), &axis_lists(), strict)
    }

    #[test]
    fn parse_everything_but_the_kitchen_sink() {
        let flags = VarcFlags::GID_IS_24BIT
            | VarcFlags::HAVE_AXES
            | VarcFlags::AXIS_VALUES_HAVE_VARIATION
            | VarcFlags::TRANSFORM_HAS_VARIATION
            | VarcFlags::HAVE_ROTATION
            | VarcFlags::HAVE_SCALE_X;
        let buf = BeBuffer::new()
            .push(flags.bits())
            .push(Uint24::new(70_000))
            // axis indices index
            .push(1u8)
            // two words: 0.5, -0.5
            .push(0x41u8)
            .extend([8192i16, -8192])
            // axis values var index
            .push(5u8)
            // transform var index
            .extend([0x80u8, 0x80])
            .push(F4Dot12::from_f32(0.5))
            .push(F6Dot10::from_f32(2.0))
            // the next record
            .push(0xffu8);
        let (component, len) = read_component(&buf, true).unwrap();
        assert_eq!(len, buf.len() - 1);
        assert_eq!(component.flags(), flags);
        assert_eq!(component.gid(), GlyphId::new(70_000));
        assert_eq!(component.axis_indices_index(), Some(1));
        assert_eq!(
            component.axis_values().unwrap().iter().collect::<Vec<_>>(),
            [8192, -8192]
        );
        assert_eq!(component.axis_values_var_index(), Some(5));
        assert_eq!(component.transform_var_index(), Some(0x80));
        let transform = component.transform();
        assert_eq!(transform.rotation(), 0.5);
        assert_eq!(transform.scale_x(), 2.0);
        // y scale follows x scale when absent
        assert_eq!(transform.scale_y(), 2.0);
        assert_eq!(transform.translate_x(), 0.0);
    }

    #[test]
    fn transform_fields_in_flag_order() {
        let flags = VarcFlags::from_bits(0x7FC0).unwrap();
        let buf = BeBuffer::new()
            .push(flags.bits())
            .push(7u16)
            .push(FWord::new(1))
            .push(FWord::new(2))
            .push(F4Dot12::from_f32(0.25))
            .push(F6Dot10::from_f32(3.0))
            .push(F6Dot10::from_f32(4.0))
            .push(F4Dot12::from_f32(0.125))
            .push(F4Dot12::from_f32(0.0625))
            .push(FWord::new(8))
            .push(FWord::new(-9));
        let (component, len) = read_component(&buf, true).unwrap();
        assert_eq!(len, 22);
        assert_eq!(component.gid(), GlyphId::new(7));
        assert_eq!(
            TransformField::ALL.map(|field| component.transform().get(field)),
            [1.0, 2.0, 0.25, 3.0, 4.0, 0.125, 0.0625, 8.0, -9.0]
        );
        assert_eq!(flags.transform_field_count(), 9);
    }

    #[test]
    fn reserved_bit() {
        let buf = BeBuffer::new().push(0x8000u16).push(1u16);
        assert_eq!(
            read_component(&buf, true).unwrap_err(),
            ReadError::MalformedComponent("reserved flag bit is set")
        );
        let (component, len) = read_component(&buf, false).unwrap();
        assert_eq!(len, 4);
        assert!(component.flags().is_empty());
    }

    #[test]
    fn axis_variations_require_axes() {
        let buf = BeBuffer::new()
            .push(VarcFlags::AXIS_VALUES_HAVE_VARIATION.bits())
            .push(1u16)
            .push(0u8);
        assert!(matches!(
            read_component(&buf, false),
            Err(ReadError::MalformedComponent(_))
        ));
    }

    #[test]
    fn truncated_component() {
        let buf = BeBuffer::new()
            .push(VarcFlags::HAVE_TRANSLATE_X.bits())
            .push(1u16)
            .push(0x12u8);
        assert!(matches!(
            read_component(&buf, false),
            Err(ReadError::MalformedComponent(_))
        ));
    }

    #[test]
    fn unknown_axis_list() {
        let buf = BeBuffer::new()
            .push(VarcFlags::HAVE_AXES.bits())
            .push(1u16)
            .push(5u8);
        assert_eq!(
            read_component(&buf, false).unwrap_err(),
            ReadError::IndexOutOfRange { index: 5, count: 2 }
        );
    }

    #[test]
    fn bad_axis_values() {
        // list 1 has two axes, but only one value is stored
        let buf = BeBuffer::new()
            .push(VarcFlags::HAVE_AXES.bits())
            .push(1u16)
            .push(1u8)
            .extend([0x01u8, 10]);
        assert_eq!(
            read_component(&buf, false).unwrap_err(),
            ReadError::MalformedTuple(5)
        );
    }

    /// A table covering glyphs 5 and 9, which are made of components
    /// referencing glyph 2.
    fn simple_table() -> BeBuffer {
        let record0 = BeBuffer::new()
            .push(VarcFlags::HAVE_TRANSLATE_X.bits())
            .push(2u16)
            .push(FWord::new(10));
        let record1 = BeBuffer::new()
            .extend([0u16, 2])
            .push(VarcFlags::USE_MY_METRICS.bits())
            .push(2u16);
        let mut buf = BeBuffer::new()
            .push(1u16)
            .push(0u16)
            .push(16u32)
            .push(0u32)
            .push(24u32)
            // coverage
            .extend([1u16, 2, 5, 9])
            // glyph records
            .push(2u32)
            .push(1u8)
            .extend([1u8, 1 + record0.len() as u8, 1 + (record0.len() + record1.len()) as u8]);
        for record in [record0, record1] {
            buf = buf.extend(record.iter().copied());
        }
        buf
    }

    #[test]
    fn read_table() {
        let buf = simple_table();
        let varc = Varc::read(buf.font_data()).unwrap();
        assert_eq!(varc.version(), (1, 0));
        assert!(varc.var_store().is_none());
        let coverage = varc.coverage().unwrap();
        assert_eq!(coverage.get(GlyphId::new(9)), Some(1));
        assert_eq!(varc.glyph_records().unwrap().count(), 2);

        let glyph = varc.glyph(0).unwrap();
        let components = glyph
            .components(&axis_lists(), true)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].gid(), GlyphId::new(2));
        assert_eq!(components[0].transform().translate_x(), 10.0);

        let glyph = varc.glyph(1).unwrap();
        let components = glyph
            .components(&axis_lists(), true)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(components.len(), 2);
        assert!(components[1].flags().contains(VarcFlags::USE_MY_METRICS));
    }

    #[test]
    fn components_stop_after_error() {
        let buf = BeBuffer::new()
            .extend([0u16, 2])
            .push(VarcFlags::HAVE_ROTATION.bits())
            .push(2u16);
        let glyph = CompositeGlyph::read(buf.font_data()).unwrap();
        let results = glyph.components(&axis_lists(), false).collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn bad_version() {
        let buf = BeBuffer::new().push(2u16).push(0u16).extend([0u32; 3]);
        assert_eq!(
            Varc::read(buf.font_data()).unwrap_err(),
            ReadError::InvalidFormat(2)
        );
    }

    #[test]
    fn axis_indices_list() {
        let buf = BeBuffer::new()
            .push(2u32)
            .push(1u8)
            .extend([1u8, 4, 5])
            .extend([0x01u8, 0, 3])
            .push(0x80u8);
        let list = AxisIndicesList::read(buf.font_data()).unwrap();
        assert_eq!(list, AxisIndicesList::new(vec![vec![0, 3], vec![0]]));
        assert_eq!(list.axis_indices(0).unwrap(), &[0, 3]);
        assert!(list.axis_indices(2).is_err());

        // axis indices must not be negative
        let buf = BeBuffer::new()
            .push(1u32)
            .push(1u8)
            .extend([1u8, 3])
            .extend([0x00u8, 0xff]);
        assert_eq!(
            AxisIndicesList::read(buf.font_data()).unwrap_err(),
            ReadError::MalformedTuple(7)
        );
    }

    #[test]
    fn flags_debug() {
        let flags = VarcFlags::HAVE_AXES | VarcFlags::HAVE_SCALE_Y;
        assert_eq!(format!("{flags:?}"), "HAVE_AXES | HAVE_SCALE_Y");
        assert_eq!(format!("{:?}", VarcFlags::empty()), "(empty)");
        assert_eq!(VarcFlags::from_bits(0x8001), None);
        assert_eq!(
            VarcFlags::from_bits_truncate(0x8001),
            VarcFlags::USE_MY_METRICS
        );
    }

    #[test]
    fn apply_deltas_in_stored_units() {
        let flags = VarcFlags::HAVE_TRANSLATE_Y | VarcFlags::HAVE_ROTATION | VarcFlags::HAVE_SCALE_X;
        let mut transform = DecomposedTransform::default();
        transform.apply_deltas(flags, &[5.0, 2048.0, 512.0]);
        assert_eq!(transform.translate_y(), 5.0);
        assert_eq!(transform.rotation(), 0.5);
        assert_eq!(transform.scale_x(), 1.5);
        assert_eq!(transform.scale_y(), 1.5);
        assert_eq!(transform.translate_x(), 0.0);
    }

    #[test]
    fn axis_value_rounding() {
        assert_eq!(axis_value_to_coord(8191.6), F2Dot14::from_bits(8192));
        assert_eq!(axis_value_to_coord(-40000.0), F2Dot14::MIN);
        assert_eq!(axis_value_to_coord(1e9), F2Dot14::MAX);
    }

    // from the python and write-side tests
    #[test]
    fn identity_matrix() {
        assert_eq!(
            DecomposedTransform::default().matrix(),
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn translate_then_scale() {
        let mut transform = DecomposedTransform::default();
        transform.set(TransformField::TranslateX, 10.0);
        transform.set(TransformField::ScaleX, 2.0);
        transform.set(TransformField::ScaleY, 2.0);
        let [a, b, c, d, e, f] = transform.matrix();
        assert_eq!([a, b, c, d, e, f], [2.0, 0.0, 0.0, 2.0, 10.0, 0.0]);
        let (x, y) = (1.0, 0.0);
        assert_eq!((a * x + c * y + e, b * x + d * y + f), (12.0, 0.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut transform = DecomposedTransform::default();
        transform.set(TransformField::Rotation, 0.5);
        assert_eq!(
            transform.matrix().round_for_test(),
            [0.0, 1.0, -1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn rotate_around_center() {
        let mut transform = DecomposedTransform::default();
        transform.set(TransformField::Rotation, 0.5);
        transform.set(TransformField::CenterX, 10.0);
        assert_eq!(
            transform.matrix().round_for_test(),
            [0.0, 1.0, -1.0, 0.0, 10.0, -10.0]
        );
    }

    #[test]
    fn skew_x() {
        let mut transform = DecomposedTransform::default();
        transform.set(TransformField::SkewX, 0.25);
        assert_eq!(
            transform.matrix().round_for_test(),
            [1.0, 0.0, -1.0, 1.0, 0.0, 0.0]
        );
    }
}
