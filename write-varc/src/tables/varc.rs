//! The [VARC (Variable Composites/Components)](https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md) table

use std::collections::BTreeMap;

use read_varc::tables::varc::VarcFlags;
use varc_types::{F2Dot14, F4Dot12, F6Dot10, FWord, GlyphId, GlyphId16, Uint24};

use super::{
    coverage::{CoverageTable, CoverageTableBuilder},
    index::Index2,
    mivs::{
        MultiItemVariationStore, MultiItemVariationStoreBuilder, SparseRegion,
        TemporaryDeltaSetId, VarStoreRemapping,
    },
    tuple_values::PackedDeltas,
    var_int::Uint32Var,
};
use crate::{
    error::Error,
    validate::{Validate, ValidationCtx},
    write::{dump_table, to_bytes, FontWrite, TableWriter},
};

/// A variation index that may not have been assigned yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarcVariationIndex {
    /// A delta set added to the builder's store, remapped when it is built.
    PendingVariationIndex(TemporaryDeltaSetId),
    /// A final `VarIdx`.
    VariationIndex(u32),
}

impl VarcVariationIndex {
    /// The final `VarIdx`.
    ///
    /// Fails if a pending index did not come from the store that produced
    /// `remappings`.
    pub fn to_u32(&self, remappings: &VarStoreRemapping) -> Result<u32, Error> {
        match self {
            VarcVariationIndex::PendingVariationIndex(temp_id) => {
                remappings.get(*temp_id).ok_or_else(|| {
                    log::warn!("pending variation index {temp_id} is not in the store");
                    Error::InvalidInput("unknown pending variation index")
                })
            }
            VarcVariationIndex::VariationIndex(idx) => Ok(*idx),
        }
    }
}

/// The transform of a component, with only the present fields stored.
///
/// Rotation and skews are in multiples of π. Rotation and `skew_y` are
/// counter-clockwise and `skew_x` is clockwise, as in fontTools. Translation
/// and center are in font units.
///
/// <https://github.com/fonttools/fonttools/blob/5e6b12d12fa08abafbeb7570f47707fbedf69a45/Lib/fontTools/misc/transform.py#L410>
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecomposedTransform {
    pub translate_x: Option<f32>,
    pub translate_y: Option<f32>,
    pub rotation: Option<f32>,
    pub scale_x: Option<f32>,
    /// If absent, the vertical scale is the same as `scale_x`.
    pub scale_y: Option<f32>,
    pub skew_x: Option<f32>,
    pub skew_y: Option<f32>,
    pub center_x: Option<f32>,
    pub center_y: Option<f32>,
}

impl DecomposedTransform {
    fn flags(&self) -> VarcFlags {
        let mut flags = VarcFlags::empty();
        for (value, flag) in [
            (self.translate_x, VarcFlags::HAVE_TRANSLATE_X),
            (self.translate_y, VarcFlags::HAVE_TRANSLATE_Y),
            (self.rotation, VarcFlags::HAVE_ROTATION),
            (self.scale_x, VarcFlags::HAVE_SCALE_X),
            (self.scale_y, VarcFlags::HAVE_SCALE_Y),
            (self.skew_x, VarcFlags::HAVE_SKEW_X),
            (self.skew_y, VarcFlags::HAVE_SKEW_Y),
            (self.center_x, VarcFlags::HAVE_TCENTER_X),
            (self.center_y, VarcFlags::HAVE_TCENTER_Y),
        ] {
            flags.set(flag, value.is_some());
        }
        flags
    }
}

fn write_fword(value: f32, field: &str, writer: &mut TableWriter) {
    let stored = FWord::from_f32_saturating(value);
    if (stored.to_i16() as f32 - value).abs() > 0.5 {
        log::warn!("{field} value {value} clamped to {}", stored.to_i16());
    }
    stored.write_into(writer);
}

macro_rules! write_fixed {
    ($ty:ty, $value:expr, $field:expr, $writer:expr) => {{
        let value: f32 = $value;
        let stored = <$ty>::from_f32(value);
        if value < <$ty>::MIN.to_f32() || value > <$ty>::MAX.to_f32() {
            log::warn!("{} value {value} clamped to {}", $field, stored.to_f32());
        }
        stored.write_into($writer);
    }};
}

impl FontWrite for DecomposedTransform {
    fn write_into(&self, writer: &mut TableWriter) {
        if let Some(translate_x) = self.translate_x {
            write_fword(translate_x, "translate_x", writer);
        }
        if let Some(translate_y) = self.translate_y {
            write_fword(translate_y, "translate_y", writer);
        }
        if let Some(rotation) = self.rotation {
            write_fixed!(F4Dot12, rotation, "rotation", writer);
        }
        if let Some(scale_x) = self.scale_x {
            write_fixed!(F6Dot10, scale_x, "scale_x", writer);
        }
        if let Some(scale_y) = self.scale_y {
            write_fixed!(F6Dot10, scale_y, "scale_y", writer);
        }
        if let Some(skew_x) = self.skew_x {
            write_fixed!(F4Dot12, skew_x, "skew_x", writer);
        }
        if let Some(skew_y) = self.skew_y {
            write_fixed!(F4Dot12, skew_y, "skew_y", writer);
        }
        if let Some(center_x) = self.center_x {
            write_fword(center_x, "center_x", writer);
        }
        if let Some(center_y) = self.center_y {
            write_fword(center_y, "center_y", writer);
        }
    }
}

/// A single component of a composite glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct VarComponent {
    pub use_my_metrics: bool,
    pub reset_unspecified_axes: bool,
    pub gid: GlyphId,
    /// Normalized values, by axis index.
    pub axis_values: Option<BTreeMap<u16, f32>>,
    pub axis_values_var_index: Option<VarcVariationIndex>,
    pub transform: DecomposedTransform,
    pub transform_var_index: Option<VarcVariationIndex>,
}

impl VarComponent {
    /// A component that places `gid` with the identity transform.
    pub fn new(gid: GlyphId) -> Self {
        Self {
            use_my_metrics: false,
            reset_unspecified_axes: false,
            gid,
            axis_values: None,
            axis_values_var_index: None,
            transform: DecomposedTransform::default(),
            transform_var_index: None,
        }
    }

    pub fn with_translate(mut self, x: f32, y: f32) -> Self {
        self.transform.translate_x = Some(x);
        self.transform.translate_y = Some(y);
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = Some(rotation);
        self
    }

    /// Set the horizontal scale, and the vertical scale if it differs.
    pub fn with_scale(mut self, x: f32, y: Option<f32>) -> Self {
        self.transform.scale_x = Some(x);
        self.transform.scale_y = y;
        self
    }

    pub fn with_skew(mut self, x: f32, y: f32) -> Self {
        self.transform.skew_x = Some(x);
        self.transform.skew_y = Some(y);
        self
    }

    pub fn with_center(mut self, x: f32, y: f32) -> Self {
        self.transform.center_x = Some(x);
        self.transform.center_y = Some(y);
        self
    }

    pub fn with_transform(mut self, transform: DecomposedTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set normalized axis values, by axis index.
    pub fn with_axis_values(mut self, values: impl IntoIterator<Item = (u16, f32)>) -> Self {
        self.axis_values = Some(values.into_iter().collect());
        self
    }

    pub fn with_reset_unspecified_axes(mut self, reset: bool) -> Self {
        self.reset_unspecified_axes = reset;
        self
    }

    pub fn with_use_my_metrics(mut self, use_my_metrics: bool) -> Self {
        self.use_my_metrics = use_my_metrics;
        self
    }

    /// Vary the axis values; the deltas are in `F2Dot14` units, one per axis
    /// in ascending axis order.
    pub fn with_axis_values_var_index(mut self, index: VarcVariationIndex) -> Self {
        self.axis_values_var_index = Some(index);
        self
    }

    /// Vary the transform; the deltas are in stored units, one per present
    /// field in storage order.
    pub fn with_transform_var_index(mut self, index: VarcVariationIndex) -> Self {
        self.transform_var_index = Some(index);
        self
    }

    fn flags(&self) -> VarcFlags {
        let mut flags = self.transform.flags();
        flags.set(VarcFlags::USE_MY_METRICS, self.use_my_metrics);
        flags.set(VarcFlags::RESET_UNSPECIFIED_AXES, self.reset_unspecified_axes);
        flags.set(VarcFlags::GID_IS_24BIT, self.gid.to_u32() > 0xFFFF);
        flags.set(VarcFlags::HAVE_AXES, self.axis_values.is_some());
        flags.set(
            VarcFlags::AXIS_VALUES_HAVE_VARIATION,
            self.axis_values_var_index.is_some(),
        );
        flags.set(
            VarcFlags::TRANSFORM_HAS_VARIATION,
            self.transform_var_index.is_some(),
        );
        flags
    }

    fn axis_indices(&self) -> Option<Vec<u16>> {
        self.axis_values
            .as_ref()
            .map(|values| values.keys().copied().collect())
    }
}

impl Validate for VarComponent {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("VarComponent", |ctx| {
            if self.gid.to_u32() > 0xFFFFFF {
                ctx.in_field("gid", |ctx| {
                    ctx.report(format!("{} does not fit in 24 bits", self.gid))
                });
            }
            if self.axis_values_var_index.is_some() && self.axis_values.is_none() {
                ctx.in_field("axis_values_var_index", |ctx| {
                    ctx.report("axis value variations require axis values")
                });
            }
            if self.transform_var_index.is_some() && self.transform.flags().is_empty() {
                ctx.in_field("transform_var_index", |ctx| {
                    ctx.report("transform variations require transform fields")
                });
            }
        })
    }
}

/// A component with its indices resolved, ready to be written.
struct RawVarComponent<'a> {
    component: &'a VarComponent,
    axis_indices_index: Option<u32>,
    axis_values_var_index: Option<u32>,
    transform_var_index: Option<u32>,
}

impl FontWrite for RawVarComponent<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        let component = self.component;
        component.flags().bits().write_into(writer);
        let gid = component.gid.to_u32();
        if gid > 0xFFFF {
            Uint24::new(gid).write_into(writer);
        } else {
            (gid as u16).write_into(writer);
        }
        if let (Some(index), Some(values)) = (self.axis_indices_index, &component.axis_values) {
            Uint32Var(index).write_into(writer);
            let raw = values
                .iter()
                .map(|(axis, value)| {
                    let stored = F2Dot14::from_f32(*value);
                    if (stored.to_f32() - value).abs() > F2Dot14::EPSILON.to_f32() {
                        log::warn!("value {value} for axis {axis} clamped to {stored}");
                    }
                    stored.to_bits() as i32
                })
                .collect();
            PackedDeltas::new(raw).write_into(writer);
        }
        if let Some(index) = self.axis_values_var_index {
            Uint32Var(index).write_into(writer);
        }
        if let Some(index) = self.transform_var_index {
            Uint32Var(index).write_into(writer);
        }
        component.transform.write_into(writer);
    }
}

/// The components of one composite glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarCompositeGlyph(pub Vec<VarComponent>);

impl VarCompositeGlyph {
    fn to_bytes(
        &self,
        axis_indices_list: &[Vec<u16>],
        remappings: &VarStoreRemapping,
    ) -> Result<Vec<u8>, Error> {
        let mut writer = TableWriter::default();
        for component in &self.0 {
            RawVarComponent {
                component,
                axis_indices_index: component.axis_indices().and_then(|axis_indices| {
                    axis_indices_list
                        .iter()
                        .position(|indices| *indices == axis_indices)
                        .map(|idx| idx as u32)
                }),
                axis_values_var_index: component
                    .axis_values_var_index
                    .map(|idx| idx.to_u32(remappings))
                    .transpose()?,
                transform_var_index: component
                    .transform_var_index
                    .map(|idx| idx.to_u32(remappings))
                    .transpose()?,
            }
            .write_into(&mut writer);
        }
        Ok(writer.into_bytes())
    }
}

impl Validate for VarCompositeGlyph {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("VarCompositeGlyph", |ctx| {
            ctx.in_field("components", |ctx| self.0.validate_impl(ctx))
        })
    }
}

/// The `VARC` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Varc {
    pub coverage: CoverageTable,
    pub var_store: Option<MultiItemVariationStore>,
    /// Serialized component records, in coverage order.
    pub glyph_records: Index2,
}

impl Validate for Varc {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Varc", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("var_store", |ctx| self.var_store.validate_impl(ctx));
            ctx.in_field("glyph_records", |ctx| {
                if self.glyph_records.count() != self.coverage.len() {
                    ctx.report("one record is required for each covered glyph");
                }
                self.glyph_records.validate_impl(ctx)
            });
        })
    }
}

impl FontWrite for Varc {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        0u16.write_into(writer);
        writer.write_offset32(&self.coverage);
        writer.write_nullable_offset32(self.var_store.as_ref().map(|s| s as &dyn FontWrite));
        writer.write_offset32(&self.glyph_records);
    }
}

/// The serialized output of a [`VarcBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledVarc {
    /// The `VARC` table.
    pub varc: Vec<u8>,
    /// The axis indices list the table's components refer to: an [`Index2`]
    /// of packed axis indices.
    pub axis_indices_list: Vec<u8>,
}

/// Builds a `VARC` table from composite glyph definitions.
#[derive(Debug, Clone, Default)]
pub struct VarcBuilder {
    glyphs: BTreeMap<GlyphId, VarCompositeGlyph>,
    store: MultiItemVariationStoreBuilder,
}

impl VarcBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `gid` as a composite of `components`, replacing any existing
    /// definition.
    pub fn add_glyph(&mut self, gid: GlyphId, components: Vec<VarComponent>) {
        self.glyphs.insert(gid, VarCompositeGlyph(components));
    }

    /// Add a delta set to the variation store.
    ///
    /// See [`MultiItemVariationStoreBuilder::add_deltas`].
    pub fn add_deltas<T: Into<i32>>(
        &mut self,
        deltas: Vec<(SparseRegion, Vec<T>)>,
    ) -> Result<VarcVariationIndex, Error> {
        self.store
            .add_deltas(deltas)
            .map(VarcVariationIndex::PendingVariationIndex)
    }

    /// Axis index lists, ordered from most to least used.
    fn create_axis_indices_list(&self) -> Vec<Vec<u16>> {
        let mut axis_indices_counter: BTreeMap<Vec<u16>, u32> = BTreeMap::new();
        for component in self.glyphs.values().flat_map(|glyph| &glyph.0) {
            if let Some(axis_indices) = component.axis_indices() {
                *axis_indices_counter.entry(axis_indices).or_insert(0) += 1;
            }
        }
        let mut axis_indices_list = axis_indices_counter.into_iter().collect::<Vec<_>>();
        // stable, so ties stay in key order
        axis_indices_list.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        axis_indices_list
            .into_iter()
            .map(|(indices, _)| indices)
            .collect()
    }

    /// Build the table, without serializing it.
    ///
    /// Also returns the axis indices list that the components refer to.
    pub fn build_table(self) -> Result<(Varc, Vec<Vec<u16>>), Error> {
        self.validate()?;
        let axis_indices_list = self.create_axis_indices_list();
        let coverage = self
            .glyphs
            .keys()
            .map(|gid| GlyphId16::try_from(*gid))
            .collect::<Result<CoverageTableBuilder, _>>()
            .map_err(|_| Error::InvalidInput("composite glyph id does not fit in 16 bits"))?
            .build();
        let (store, remappings) = self.store.build();
        let glyph_records = Index2::from_items(
            self.glyphs
                .values()
                .map(|glyph| glyph.to_bytes(&axis_indices_list, &remappings))
                .collect::<Result<_, _>>()?,
        );
        log::debug!(
            "built VARC with {} glyphs and {} axis index lists",
            glyph_records.count(),
            axis_indices_list.len()
        );
        let varc = Varc {
            coverage,
            var_store: (!store.is_empty()).then_some(store),
            glyph_records,
        };
        Ok((varc, axis_indices_list))
    }

    /// Build and serialize the table and its axis indices list.
    pub fn build(self) -> Result<CompiledVarc, Error> {
        let (varc, axis_indices_list) = self.build_table()?;
        let axis_indices_list = Index2::from_items(
            axis_indices_list
                .iter()
                .map(|indices| {
                    let packed = PackedDeltas::new(indices.iter().map(|v| *v as i32).collect());
                    to_bytes(&packed)
                })
                .collect(),
        );
        Ok(CompiledVarc {
            varc: dump_table(&varc)?,
            axis_indices_list: dump_table(&axis_indices_list)?,
        })
    }
}

impl Validate for VarcBuilder {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("VarcBuilder", |ctx| {
            ctx.in_field("glyphs", |ctx| {
                ctx.in_array(self.glyphs.values(), |ctx, glyph| glyph.validate_impl(ctx))
            })
        })
    }
}
