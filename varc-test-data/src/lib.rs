//! test data shared between the varc crates.
//!
//! Glyphs below [`FIRST_COMPOSITE`] are never covered, so they are leaves in
//! every fixture.

use read_varc::types::{F2Dot14, GlyphId};
use write_varc::tables::{
    mivs::SparseRegion,
    varc::{VarComponent, VarcBuilder},
};

pub use write_varc::tables::varc::CompiledVarc;

pub const LEAF_A: GlyphId = GlyphId::new(1);
pub const LEAF_B: GlyphId = GlyphId::new(2);

/// The lowest composite glyph id used by the fixtures.
pub const FIRST_COMPOSITE: GlyphId = GlyphId::new(10);

/// The weight axis, in fixtures that vary.
pub const WGHT: u16 = 0;
/// The width axis, in fixtures that vary.
pub const WDTH: u16 = 1;

fn build(builder: VarcBuilder) -> CompiledVarc {
    builder.build().expect("fixtures are valid")
}

pub mod simple {
    //! Static composites.
    use super::*;

    /// `LEAF_A` translated by (10, 0) and scaled by 2, with every other
    /// transform field stored at its default; then `LEAF_B` moved up by 50.
    pub const TRANSLATE_THEN_SCALE: GlyphId = GlyphId::new(10);
    /// [`TRANSLATE_THEN_SCALE`] moved up by 100.
    pub const NESTED: GlyphId = GlyphId::new(11);
    /// `LEAF_A` rotated a quarter turn around (100, 0).
    pub const ROTATED: GlyphId = GlyphId::new(12);
    /// A composite whose only component sets "use my metrics".
    pub const METRICS: GlyphId = GlyphId::new(13);

    pub fn varc() -> CompiledVarc {
        let mut builder = VarcBuilder::new();
        builder.add_glyph(
            TRANSLATE_THEN_SCALE,
            vec![
                VarComponent::new(LEAF_A)
                    .with_translate(10.0, 0.0)
                    .with_rotation(0.0)
                    .with_scale(2.0, Some(2.0))
                    .with_center(0.0, 0.0),
                VarComponent::new(LEAF_B).with_translate(0.0, 50.0),
            ],
        );
        builder.add_glyph(
            NESTED,
            vec![VarComponent::new(TRANSLATE_THEN_SCALE).with_translate(0.0, 100.0)],
        );
        builder.add_glyph(
            ROTATED,
            vec![VarComponent::new(LEAF_A)
                .with_rotation(0.5)
                .with_center(100.0, 0.0)],
        );
        builder.add_glyph(
            METRICS,
            vec![VarComponent::new(LEAF_B).with_use_my_metrics(true)],
        );
        build(builder)
    }
}

pub mod axes {
    //! Composites that set axis coordinates for their children.
    use super::*;

    /// `LEAF_A` with `WDTH` set to 0.25 and the other axes reset.
    pub const RESET: GlyphId = GlyphId::new(20);
    /// `LEAF_A` with `WDTH` set to 0.25 and the other axes inherited.
    pub const INHERIT: GlyphId = GlyphId::new(21);
    /// [`RESET`], placed by a composite that sets `WGHT` to 1.0.
    pub const OUTER: GlyphId = GlyphId::new(22);

    pub fn varc() -> CompiledVarc {
        let mut builder = VarcBuilder::new();
        builder.add_glyph(
            RESET,
            vec![VarComponent::new(LEAF_A)
                .with_axis_values([(WDTH, 0.25)])
                .with_reset_unspecified_axes(true)],
        );
        builder.add_glyph(
            INHERIT,
            vec![VarComponent::new(LEAF_A).with_axis_values([(WDTH, 0.25)])],
        );
        builder.add_glyph(
            OUTER,
            vec![VarComponent::new(RESET).with_axis_values([(WGHT, 1.0)])],
        );
        build(builder)
    }
}

pub mod variable {
    //! Composites with variations along `WGHT`.
    use super::*;

    /// `LEAF_A` at (10, 0), moving right by 100 units at full weight, with
    /// `WDTH` going from 0 to 0.5 at full weight.
    pub const MOVING: GlyphId = GlyphId::new(40);
    /// `LEAF_B` scaled from 1 to 1.5 at full weight, and at -1 weight rotated
    /// by a quarter turn.
    pub const SCALING: GlyphId = GlyphId::new(41);
    /// [`MOVING`] with `WGHT` pinned to 1.0.
    pub const PINNED: GlyphId = GlyphId::new(42);

    pub fn varc() -> CompiledVarc {
        let mut builder = VarcBuilder::new();
        let heavy = SparseRegion::single_axis(WGHT, F2Dot14::ONE);
        let light = SparseRegion::single_axis(WGHT, F2Dot14::from_f32(-1.0));

        let translate = builder
            .add_deltas(vec![(heavy.clone(), vec![100i32, 0])])
            .expect("tuples have equal lengths");
        let wdth = builder
            .add_deltas(vec![(heavy.clone(), vec![F2Dot14::from_f32(0.5).to_bits()])])
            .expect("tuples have equal lengths");
        // rotation in F4Dot12 units, scale in F6Dot10 units
        let rotate_and_scale = builder
            .add_deltas(vec![
                (heavy, vec![0i32, 512]),
                (light, vec![2048i32, 0]),
            ])
            .expect("tuples have equal lengths");

        builder.add_glyph(
            MOVING,
            vec![VarComponent::new(LEAF_A)
                .with_translate(10.0, 0.0)
                .with_transform_var_index(translate)
                .with_axis_values([(WDTH, 0.0)])
                .with_axis_values_var_index(wdth)],
        );
        builder.add_glyph(
            SCALING,
            vec![VarComponent::new(LEAF_B)
                .with_rotation(0.0)
                .with_scale(1.0, None)
                .with_transform_var_index(rotate_and_scale)],
        );
        builder.add_glyph(
            PINNED,
            vec![VarComponent::new(MOVING).with_axis_values([(WGHT, 1.0)])],
        );
        build(builder)
    }
}

pub mod cycles {
    //! Composites that refer to themselves.
    use super::*;

    pub const SELF_REFERENCE: GlyphId = GlyphId::new(30);
    pub const PING: GlyphId = GlyphId::new(31);
    pub const PONG: GlyphId = GlyphId::new(32);
    /// An acyclic glyph that places [`PING`].
    pub const ENTERS_CYCLE: GlyphId = GlyphId::new(33);

    pub fn varc() -> CompiledVarc {
        let mut builder = VarcBuilder::new();
        builder.add_glyph(
            SELF_REFERENCE,
            vec![VarComponent::new(SELF_REFERENCE).with_translate(1.0, 0.0)],
        );
        builder.add_glyph(PING, vec![VarComponent::new(PONG)]);
        builder.add_glyph(PONG, vec![VarComponent::new(LEAF_A), VarComponent::new(PING)]);
        builder.add_glyph(
            ENTERS_CYCLE,
            vec![VarComponent::new(LEAF_B), VarComponent::new(PING)],
        );
        build(builder)
    }
}

/// A chain of `len` composites, each placing the previous one moved right
/// by one unit; the first places `LEAF_A`.
///
/// Returns the table and the glyph at the top of the chain.
pub fn chain(len: u16) -> (CompiledVarc, GlyphId) {
    let first = FIRST_COMPOSITE.to_u32();
    let mut builder = VarcBuilder::new();
    let mut child = LEAF_A;
    for i in 0..len as u32 {
        let gid = GlyphId::new(first + i);
        builder.add_glyph(gid, vec![VarComponent::new(child).with_translate(1.0, 0.0)]);
        child = gid;
    }
    (build(builder), child)
}

/// `depth` levels of composites that each place the next level `width`
/// times; the last level places `LEAF_A`.
///
/// The glyph at the top resolves to `width.pow(depth)` placements.
pub fn fan_out(width: u16, depth: u16) -> (CompiledVarc, GlyphId) {
    let mut builder = VarcBuilder::new();
    let top = add_levels(&mut builder, FIRST_COMPOSITE.to_u32(), LEAF_A, width, depth);
    (build(builder), top)
}

/// Like [`fan_out`], but the bottom level places a composite with no
/// components, so the glyph at the top resolves to nothing.
pub fn hollow_fan_out(width: u16, depth: u16) -> (CompiledVarc, GlyphId) {
    let mut builder = VarcBuilder::new();
    builder.add_glyph(FIRST_COMPOSITE, Vec::new());
    let first = FIRST_COMPOSITE.to_u32() + 1;
    let top = add_levels(&mut builder, first, FIRST_COMPOSITE, width, depth);
    (build(builder), top)
}

fn add_levels(
    builder: &mut VarcBuilder,
    first: u32,
    bottom: GlyphId,
    width: u16,
    depth: u16,
) -> GlyphId {
    let mut child = bottom;
    for level in 0..depth as u32 {
        let gid = GlyphId::new(first + level);
        let components = (0..width)
            .map(|i| VarComponent::new(child).with_translate(i as f32, 0.0))
            .collect();
        builder.add_glyph(gid, components);
        child = gid;
    }
    child
}
