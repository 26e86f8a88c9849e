//! Flattening composite glyphs into leaf placements.

use std::{borrow::Cow, sync::OnceLock};

use read_varc::{
    tables::{
        coverage::CoverageTable,
        index::Index2Of,
        mivs::{MultiItemVariationStore, SCALAR_NOT_CACHED},
        varc::{
            axis_value_to_coord, AxisIndexResolver, AxisIndicesList, CompositeGlyph, Varc,
            VarComponent, VarcFlags,
        },
        variations::NO_VARIATION_INDEX,
    },
    types::GlyphId,
    FontData, FontRead, ReadError,
};

use crate::{
    context::AxisContext,
    error::ResolveError,
    pen::{OutlinePen, OutlineProvider, TransformPen},
    transform::Affine,
};

/// The default limit on the depth of a component tree.
///
/// This matches the recursion limit for classic composite glyphs.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The default limit on the number of components, composite or leaf, that a
/// single glyph expands to.
pub const DEFAULT_MAX_PLACEMENTS: usize = 65_536;

/// Configuration for a [`Resolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolverSettings {
    max_depth: usize,
    max_placements: usize,
    strict: bool,
    cache: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_placements: DEFAULT_MAX_PLACEMENTS,
            strict: false,
            cache: true,
        }
    }
}

impl ResolverSettings {
    /// Sets the maximum number of nested composites below a requested glyph.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of components placed while resolving a
    /// requested glyph.
    ///
    /// Every component counts, including those that place composites, so
    /// trees that produce few leaves still have bounded work.
    pub fn with_max_placements(mut self, max_placements: usize) -> Self {
        self.max_placements = max_placements;
        self
    }

    /// If `true`, components with the reserved flag bit set are errors.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// If `true`, each composite record is decoded once and kept for the
    /// lifetime of the resolver.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_placements(&self) -> usize {
        self.max_placements
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn cache(&self) -> bool {
        self.cache
    }
}

/// A leaf glyph, positioned by a composite.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub glyph_id: GlyphId,
    /// Maps the leaf's outline into the space of the requested glyph.
    pub transform: Affine,
    /// The location to draw the leaf at.
    pub coords: AxisContext,
    /// Set if the component that placed this leaf asks for its metrics to
    /// be used for the composite.
    pub use_my_metrics: bool,
}

/// Receives the leaves of a composite glyph as they are found.
pub trait PlacementSink {
    fn place(
        &mut self,
        glyph_id: GlyphId,
        transform: Affine,
        coords: &AxisContext,
        use_my_metrics: bool,
    ) -> Result<(), ResolveError>;
}

impl PlacementSink for Vec<Placement> {
    fn place(
        &mut self,
        glyph_id: GlyphId,
        transform: Affine,
        coords: &AxisContext,
        use_my_metrics: bool,
    ) -> Result<(), ResolveError> {
        self.push(Placement {
            glyph_id,
            transform,
            coords: coords.clone(),
            use_my_metrics,
        });
        Ok(())
    }
}

type DecodedRecord<'a> = Result<Vec<VarComponent<'a>>, ReadError>;

/// Resolves composite glyphs from a `VARC` table.
///
/// All tables are parsed when the resolver is created; resolution only
/// reads them, so a resolver can be shared between threads.
pub struct Resolver<'a> {
    coverage: CoverageTable<'a>,
    glyph_records: Index2Of<'a, CompositeGlyph<'a>>,
    var_store: Option<MultiItemVariationStore<'a>>,
    axis_indices: AxisIndicesList,
    settings: ResolverSettings,
    // one slot per coverage index; empty if caching is off
    decoded: Vec<OnceLock<DecodedRecord<'a>>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for `varc`, whose components refer to the lists in
    /// `axis_indices`.
    pub fn new(varc: &Varc<'a>, axis_indices: AxisIndicesList) -> Result<Self, ReadError> {
        let mut resolver = Self {
            coverage: varc.coverage()?,
            glyph_records: varc.glyph_records()?,
            var_store: varc.var_store().transpose()?,
            axis_indices,
            settings: ResolverSettings::default(),
            decoded: Vec::new(),
        };
        resolver.reset_cache();
        Ok(resolver)
    }

    /// Create a resolver from the raw bytes of a `VARC` table and its axis
    /// indices list.
    pub fn from_bytes(varc: &'a [u8], axis_indices_list: &[u8]) -> Result<Self, ReadError> {
        let varc = Varc::read(FontData::new(varc))?;
        let axis_indices = AxisIndicesList::read(FontData::new(axis_indices_list))?;
        Self::new(&varc, axis_indices)
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self.reset_cache();
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Returns `true` if `glyph_id` has a composite definition.
    pub fn is_composite(&self, glyph_id: GlyphId) -> bool {
        self.coverage.get(glyph_id).is_some()
    }

    fn reset_cache(&mut self) {
        self.decoded = if self.settings.cache {
            (0..self.glyph_records.count()).map(|_| OnceLock::new()).collect()
        } else {
            Vec::new()
        };
    }

    /// Flatten `glyph_id` at `coords` into a list of leaf placements.
    ///
    /// Returns `None` if the glyph is not a composite; its outline should be
    /// drawn directly.
    pub fn resolve(
        &self,
        glyph_id: GlyphId,
        coords: &AxisContext,
    ) -> Result<Option<Vec<Placement>>, ResolveError> {
        let mut placements = Vec::new();
        Ok(self
            .resolve_into(glyph_id, coords, &mut placements)?
            .then_some(placements))
    }

    /// Flatten `glyph_id` at `coords`, passing each leaf to `sink`.
    ///
    /// Returns `false` if the glyph is not a composite.
    pub fn resolve_into(
        &self,
        glyph_id: GlyphId,
        coords: &AxisContext,
        sink: &mut impl PlacementSink,
    ) -> Result<bool, ResolveError> {
        let Some(coverage_index) = self.coverage.get(glyph_id) else {
            return Ok(false);
        };
        let mut walk = Walk {
            root: glyph_id,
            stack: Vec::new(),
            placed: 0,
            sink,
        };
        self.resolve_glyph(glyph_id, coverage_index, coords, Affine::IDENTITY, &mut walk)
            .inspect_err(|e| log::debug!("failed to resolve {glyph_id}: {e}"))?;
        Ok(true)
    }

    /// Draw `glyph_id` at `coords` into `pen`, with leaf outlines from
    /// `outlines`.
    ///
    /// Glyphs that are not composites are drawn directly.
    pub fn draw(
        &self,
        glyph_id: GlyphId,
        coords: &AxisContext,
        outlines: &impl OutlineProvider,
        pen: &mut impl OutlinePen,
    ) -> Result<(), ResolveError> {
        let mut sink = DrawSink { outlines, pen };
        if !self.resolve_into(glyph_id, coords, &mut sink)? {
            outlines.draw_outline(glyph_id, coords, sink.pen)?;
        }
        Ok(())
    }

    fn resolve_glyph<S: PlacementSink + ?Sized>(
        &self,
        glyph_id: GlyphId,
        coverage_index: u16,
        coords: &AxisContext,
        parent: Affine,
        walk: &mut Walk<'_, S>,
    ) -> Result<(), ResolveError> {
        if walk.stack.contains(&glyph_id) {
            log::debug!("cycle through {glyph_id} below {}", walk.root);
            return Err(ResolveError::RecursionLimitExceeded(glyph_id));
        }
        if walk.stack.len() > self.settings.max_depth {
            log::debug!("depth limit reached at {glyph_id} below {}", walk.root);
            return Err(ResolveError::RecursionLimitExceeded(glyph_id));
        }
        let components = self
            .components(coverage_index)
            .map_err(ResolveError::read(glyph_id))?;
        let mut scalar_cache = self
            .var_store
            .as_ref()
            .map(|store| vec![SCALAR_NOT_CACHED; store.region_count()])
            .unwrap_or_default();
        let mut deltas = Vec::new();

        walk.stack.push(glyph_id);
        for component in components.iter() {
            walk.placed += 1;
            if walk.placed > self.settings.max_placements {
                log::debug!("{} has more than {} components", walk.root, walk.placed - 1);
                return Err(ResolveError::TooManyPlacements(walk.root));
            }
            let flags = component.flags();
            let child_gid = component.gid();
            let child_coords = self
                .component_coords(component, coords, &mut scalar_cache, &mut deltas)
                .map_err(ResolveError::read(glyph_id))?;
            let mut transform = *component.transform();
            if let Some(var_idx) = component.transform_var_index() {
                deltas.clear();
                deltas.resize(flags.transform_fields().count(), 0.0);
                self.evaluate(var_idx, coords, &mut deltas, &mut scalar_cache)
                    .map_err(ResolveError::read(glyph_id))?;
                transform.apply_deltas(flags, &deltas);
            }
            let matrix = parent * Affine::new(transform.matrix());
            log::trace!(
                "{glyph_id} places {child_gid} at {:?} with {:?}",
                matrix.as_coeffs(),
                child_coords.coords()
            );
            match self.coverage.get(child_gid) {
                Some(child_index) => {
                    self.resolve_glyph(child_gid, child_index, &child_coords, matrix, walk)?
                }
                None => {
                    walk.sink.place(
                        child_gid,
                        matrix,
                        &child_coords,
                        flags.contains(VarcFlags::USE_MY_METRICS),
                    )?;
                }
            }
        }
        walk.stack.pop();
        Ok(())
    }

    /// The decoded components of the record at `coverage_index`.
    fn components(&self, coverage_index: u16) -> Result<Cow<'_, [VarComponent<'a>]>, ReadError> {
        let index = coverage_index as usize;
        match self.decoded.get(index) {
            Some(slot) => match slot.get_or_init(|| self.decode(index)) {
                Ok(components) => Ok(Cow::Borrowed(components)),
                Err(e) => Err(e.clone()),
            },
            None => self.decode(index).map(Cow::Owned),
        }
    }

    fn decode(&self, index: usize) -> DecodedRecord<'a> {
        self.glyph_records
            .get(index)?
            .components(&self.axis_indices, self.settings.strict)
            .collect()
    }

    /// The location for the child of `component`, when its parent is at
    /// `coords`.
    fn component_coords(
        &self,
        component: &VarComponent<'a>,
        coords: &AxisContext,
        scalar_cache: &mut [f32],
        deltas: &mut Vec<f32>,
    ) -> Result<AxisContext, ReadError> {
        let flags = component.flags();
        let mut child_coords = if flags.contains(VarcFlags::RESET_UNSPECIFIED_AXES) {
            AxisContext::new()
        } else {
            coords.clone()
        };
        let (Some(axis_indices_index), Some(values)) =
            (component.axis_indices_index(), component.axis_values())
        else {
            return Ok(child_coords);
        };
        let axis_indices = self.axis_indices.axis_indices(axis_indices_index)?;
        deltas.clear();
        deltas.resize(axis_indices.len(), 0.0);
        if let Some(var_idx) = component.axis_values_var_index() {
            self.evaluate(var_idx, coords, deltas, scalar_cache)?;
        }
        for ((axis, value), delta) in axis_indices.iter().zip(values.iter()).zip(deltas.iter()) {
            child_coords.set(*axis, axis_value_to_coord(value as f32 + delta));
        }
        Ok(child_coords)
    }

    fn evaluate(
        &self,
        var_idx: u32,
        coords: &AxisContext,
        out: &mut [f32],
        scalar_cache: &mut [f32],
    ) -> Result<(), ReadError> {
        if var_idx == NO_VARIATION_INDEX {
            out.fill(0.0);
            return Ok(());
        }
        let store = self.var_store.as_ref().ok_or(ReadError::NullOffset)?;
        store.evaluate(var_idx, coords.coords(), out, Some(scalar_cache))
    }
}

/// State for resolving one requested glyph.
struct Walk<'s, S: ?Sized> {
    root: GlyphId,
    /// Composites on the path from the root to the current glyph.
    stack: Vec<GlyphId>,
    /// Components visited so far, composite or leaf.
    placed: usize,
    sink: &'s mut S,
}

struct DrawSink<'p, O, P> {
    outlines: &'p O,
    pen: &'p mut P,
}

impl<O: OutlineProvider, P: OutlinePen> PlacementSink for DrawSink<'_, O, P> {
    fn place(
        &mut self,
        glyph_id: GlyphId,
        transform: Affine,
        coords: &AxisContext,
        _use_my_metrics: bool,
    ) -> Result<(), ResolveError> {
        let mut pen = TransformPen::new(&mut *self.pen, transform);
        self.outlines.draw_outline(glyph_id, coords, &mut pen)
    }
}
