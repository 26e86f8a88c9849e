//! Building the multi-item variation store
//!
//! Where an OpenType item variation store holds a single delta per region,
//! the multi-item store holds a tuple of deltas per region, and uses a
//! sparse representation of regions (only active axes are stored).

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use varc_types::F2Dot14;

use super::{index::Index2, tuple_values::PackedDeltas};
use crate::{
    error::Error,
    validate::{Validate, ValidationCtx},
    write::{to_bytes, FontWrite, TableWriter},
};

pub use read_varc::tables::variations::NO_VARIATION_INDEX;

/// An identifier for a delta set, valid until the store is built.
pub type TemporaryDeltaSetId = u32;

/// The support of a region along one axis: `(axis_index, start, peak, end)`.
pub type RegionAxisSupport = (u16, F2Dot14, F2Dot14, F2Dot14);

/// A sparse region definition, listing only the axes it depends on.
///
/// This is also the key for deduplicating regions in the builder.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseRegion(Vec<RegionAxisSupport>);

impl SparseRegion {
    /// Create a new sparse region from per-axis supports.
    ///
    /// Axes are sorted by index; all-zero triples place no constraint on a
    /// region and are dropped.
    pub fn new(mut axes: Vec<RegionAxisSupport>) -> Self {
        axes.sort_by_key(|(idx, _, _, _)| *idx);
        axes.retain(|(_, start, peak, end)| {
            *start != F2Dot14::ZERO || *peak != F2Dot14::ZERO || *end != F2Dot14::ZERO
        });
        Self(axes)
    }

    /// A region on a single axis, supported from the default to `peak`.
    pub fn single_axis(axis_index: u16, peak: F2Dot14) -> Self {
        let start = peak.min(F2Dot14::ZERO);
        let end = peak.max(F2Dot14::ZERO);
        Self::new(vec![(axis_index, start, peak, end)])
    }

    /// Returns true if this region has no active axes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn axes(&self) -> &[RegionAxisSupport] {
        &self.0
    }
}

impl Validate for SparseRegion {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("SparseRegion", |ctx| {
            if self.0.len() > u16::MAX as usize {
                ctx.report("too many axes");
            }
        })
    }
}

impl FontWrite for SparseRegion {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.0.len() as u16).write_into(writer);
        for (axis_index, start, peak, end) in &self.0 {
            axis_index.write_into(writer);
            start.write_into(writer);
            peak.write_into(writer);
            end.write_into(writer);
        }
    }
}

/// The shared list of regions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct SparseRegionList<'a>(&'a [SparseRegion]);

impl FontWrite for SparseRegionList<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.0.len() as u16).write_into(writer);
        for region in self.0 {
            writer.write_offset32(region);
        }
    }
}

/// A compiled multi-item variation store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiItemVariationStore {
    pub regions: Vec<SparseRegion>,
    pub variation_data: Vec<MultiItemVariationData>,
}

/// A block of delta sets that share a list of regions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiItemVariationData {
    pub region_indices: Vec<u16>,
    /// Packed delta rows, region-major.
    pub delta_sets: Index2,
}

impl MultiItemVariationStore {
    /// Returns `true` if the store holds no delta sets.
    pub fn is_empty(&self) -> bool {
        self.variation_data.is_empty()
    }
}

impl Validate for MultiItemVariationStore {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("MultiItemVariationStore", |ctx| {
            ctx.in_field("regions", |ctx| {
                if self.regions.len() > u16::MAX as usize {
                    ctx.report("too many regions");
                }
                self.regions.validate_impl(ctx);
            });
            ctx.in_field("variation_data", |ctx| {
                // the last outer index is reserved for NO_VARIATION_INDEX
                if self.variation_data.len() >= u16::MAX as usize {
                    ctx.report("too many variation data subtables");
                }
                self.variation_data.validate_impl(ctx);
            });
        })
    }
}

impl FontWrite for MultiItemVariationStore {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        writer.write_offset32(&SparseRegionList(&self.regions));
        (self.variation_data.len() as u16).write_into(writer);
        for data in &self.variation_data {
            writer.write_offset32(data);
        }
    }
}

impl Validate for MultiItemVariationData {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("MultiItemVariationData", |ctx| {
            if self.region_indices.len() > u16::MAX as usize {
                ctx.in_field("region_indices", |ctx| ctx.report("too many regions"));
            }
            if self.delta_sets.count() > u16::MAX as usize {
                ctx.in_field("delta_sets", |ctx| ctx.report("too many delta sets"));
            }
            self.delta_sets.validate_impl(ctx);
        })
    }
}

impl FontWrite for MultiItemVariationData {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        (self.region_indices.len() as u16).write_into(writer);
        self.region_indices.write_into(writer);
        self.delta_sets.write_into(writer);
    }
}

/// A map from the temporary delta set identifiers to the final `VarIdx`.
///
/// This is generated when the store is built; afterwards anything that
/// refers to a delta set needs to be remapped.
#[derive(Clone, Debug, Default)]
pub struct VarStoreRemapping {
    map: HashMap<TemporaryDeltaSetId, u32>,
}

impl VarStoreRemapping {
    fn set(&mut self, from: TemporaryDeltaSetId, to: u32) {
        self.map.insert(from, to);
    }

    /// The final index for a temporary id.
    ///
    /// [`NO_VARIATION_INDEX`] always maps to itself.
    pub fn get(&self, from: TemporaryDeltaSetId) -> Option<u32> {
        if from == NO_VARIATION_INDEX {
            return Some(NO_VARIATION_INDEX);
        }
        self.map.get(&from).copied()
    }
}

/// A delta set: tuples of deltas for each region.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct MultiDeltaSet {
    /// The number of values per region.
    tuple_len: usize,
    /// Per-region delta tuples, sorted by region index.
    deltas: Vec<(u16, Vec<i32>)>,
}

impl MultiDeltaSet {
    /// Flatten the tuples into one row, in the order of `region_indices`.
    ///
    /// Regions without deltas contribute zeros.
    fn flatten(&self, region_indices: &[u16]) -> Vec<i32> {
        let mut result = Vec::with_capacity(region_indices.len() * self.tuple_len);
        for region_idx in region_indices {
            match self.deltas.iter().find(|(idx, _)| idx == region_idx) {
                Some((_, tuple)) => result.extend_from_slice(tuple),
                None => result.extend(std::iter::repeat_n(0, self.tuple_len)),
            }
        }
        result
    }
}

/// A builder for the [`MultiItemVariationStore`]
///
/// This handles assigning variation indices to unique sets of tuple deltas
/// and grouping delta sets into [`MultiItemVariationData`] subtables.
#[derive(Clone, Debug, Default)]
pub struct MultiItemVariationStoreBuilder {
    /// Regions in the order they were first seen.
    all_regions: IndexSet<SparseRegion>,
    /// Deduplicates identical delta sets.
    delta_sets: IndexMap<MultiDeltaSet, TemporaryDeltaSetId>,
}

impl MultiItemVariationStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no deltas have been added to this builder.
    pub fn is_empty(&self) -> bool {
        self.delta_sets.is_empty()
    }

    /// Add a set of tuple deltas and return a temporary ID.
    ///
    /// Each tuple must have the same length. Tuples for empty regions and
    /// tuples that are all zero are dropped, and tuples for the same region
    /// are summed. If nothing remains, this returns [`NO_VARIATION_INDEX`].
    ///
    /// The final `VarIdx` is available from the remapping returned by
    /// [`build`](Self::build).
    pub fn add_deltas<T: Into<i32>>(
        &mut self,
        deltas: Vec<(SparseRegion, Vec<T>)>,
    ) -> Result<TemporaryDeltaSetId, Error> {
        let tuple_len = deltas.first().map(|(_, tuple)| tuple.len()).unwrap_or(0);

        let mut by_region: Vec<(u16, Vec<i32>)> = Vec::with_capacity(deltas.len());
        for (region, tuple) in deltas {
            if tuple.len() != tuple_len {
                return Err(Error::InvalidInput(
                    "all delta tuples in a delta set must have the same length",
                ));
            }
            if region.is_empty() {
                continue;
            }
            let region_idx = self.canonical_index_for_region(region)?;
            let tuple = tuple.into_iter().map(Into::<i32>::into);
            match by_region.iter_mut().find(|(idx, _)| *idx == region_idx) {
                Some((_, existing)) => existing
                    .iter_mut()
                    .zip(tuple)
                    .for_each(|(a, b)| *a = a.saturating_add(b)),
                None => by_region.push((region_idx, tuple.collect())),
            }
        }
        by_region.retain(|(_, tuple)| tuple.iter().any(|v| *v != 0));
        by_region.sort_by_key(|(idx, _)| *idx);

        if by_region.is_empty() {
            return Ok(NO_VARIATION_INDEX);
        }

        let delta_set = MultiDeltaSet {
            tuple_len,
            deltas: by_region,
        };
        let next_id = self.delta_sets.len() as TemporaryDeltaSetId;
        Ok(*self.delta_sets.entry(delta_set).or_insert(next_id))
    }

    fn canonical_index_for_region(&mut self, region: SparseRegion) -> Result<u16, Error> {
        let (idx, _) = self.all_regions.insert_full(region);
        u16::try_from(idx).map_err(|_| Error::InvalidInput("too many regions"))
    }

    /// Build the [`MultiItemVariationStore`].
    ///
    /// This also returns a structure that can be used to remap the temporarily
    /// assigned delta set IDs to their final `VarIdx` values.
    pub fn build(self) -> (MultiItemVariationStore, VarStoreRemapping) {
        let mut key_map = VarStoreRemapping::default();
        if self.delta_sets.is_empty() {
            return (MultiItemVariationStore::default(), key_map);
        }

        // group delta sets that use the same regions
        let mut groups: IndexMap<Vec<u16>, Vec<(&MultiDeltaSet, TemporaryDeltaSetId)>> =
            IndexMap::new();
        for (delta_set, temp_id) in &self.delta_sets {
            let region_indices = delta_set.deltas.iter().map(|(idx, _)| *idx).collect();
            groups
                .entry(region_indices)
                .or_default()
                .push((delta_set, *temp_id));
        }

        let mut variation_data = Vec::with_capacity(groups.len());
        for (region_indices, delta_sets) in groups {
            // inner index 0xFFFF is never assigned
            for chunk in delta_sets.chunks(0xFFFF) {
                let outer = variation_data.len() as u32;
                let mut items = Vec::with_capacity(chunk.len());
                for (inner, (delta_set, temp_id)) in chunk.iter().enumerate() {
                    let row = PackedDeltas::new(delta_set.flatten(&region_indices));
                    items.push(to_bytes(&row));
                    key_map.set(*temp_id, (outer << 16) | inner as u32);
                }
                log::trace!(
                    "variation data {outer}: {} regions, {} delta sets",
                    region_indices.len(),
                    items.len()
                );
                variation_data.push(MultiItemVariationData {
                    region_indices: region_indices.clone(),
                    delta_sets: Index2::from_items(items),
                });
            }
        }

        let store = MultiItemVariationStore {
            regions: self.all_regions.into_iter().collect(),
            variation_data,
        };
        (store, key_map)
    }
}
