//! The multi-item variation store
//!
//! This is a variant of the OpenType [item variation store] in which each
//! delta set holds a tuple of values per region rather than a single value,
//! and regions are sparse: each region only lists the axes it depends on.
//!
//! [item variation store]: https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#item-variation-store

use alloc::vec::Vec;

use types::{BigEndian, F2Dot14};

use super::{
    index::Index2,
    variations::{TupleValues, NO_VARIATION_INDEX},
};
use crate::{FontData, FontRead, ReadError};

/// Marker value for an empty slot in a region scalar cache.
///
/// Region scalars are always in `0.0..=1.0`.
pub const SCALAR_NOT_CACHED: f32 = 2.0;

/// A multi-item variation store.
///
/// The region list and the variation data blocks are located once, when the
/// store is read; delta sets are decoded on demand.
#[derive(Clone, Debug)]
pub struct MultiItemVariationStore<'a> {
    regions: Vec<SparseRegion<'a>>,
    variation_data: Vec<MultiItemVariationData<'a>>,
}

impl<'a> FontRead<'a> for MultiItemVariationStore<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format as _));
        }
        let region_list_offset: u32 = cursor.read()?;
        let data_count: u16 = cursor.read()?;
        let data_offsets = cursor.read_array::<u32>(data_count as usize)?;

        let regions = if region_list_offset == 0 {
            Vec::new()
        } else {
            read_region_list(data.split_off(region_list_offset as usize).ok_or(
                ReadError::TruncatedInput(data.absolute(region_list_offset as usize)),
            )?)?
        };
        let variation_data = data_offsets
            .iter()
            .map(|offset| match offset.get() {
                0 => Err(ReadError::NullOffset),
                offset => data.read_subtable(offset as usize),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            regions,
            variation_data,
        })
    }
}

fn read_region_list<'a>(data: FontData<'a>) -> Result<Vec<SparseRegion<'a>>, ReadError> {
    let mut cursor = data.cursor();
    let count: u16 = cursor.read()?;
    let offsets = cursor.read_array::<u32>(count as usize)?;
    offsets
        .iter()
        .map(|offset| data.read_subtable(offset.get() as usize))
        .collect()
}

impl<'a> MultiItemVariationStore<'a> {
    /// The shared list of regions.
    pub fn regions(&self) -> &[SparseRegion<'a>] {
        &self.regions
    }

    /// The number of regions, for sizing a scalar cache.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// The variation data blocks, addressed by the outer half of a variation index.
    pub fn variation_data(&self) -> &[MultiItemVariationData<'a>] {
        &self.variation_data
    }

    /// Computes the interpolated tuple for `var_idx` at the given coordinates,
    /// writing it to `out`.
    ///
    /// `coords` are normalized coordinates indexed by axis index; missing axes
    /// are at the default. The delta set must hold exactly `out.len()` values
    /// per region.
    ///
    /// If provided, `scalar_cache` is indexed by region index. Slots holding
    /// [`SCALAR_NOT_CACHED`] are computed and filled in. A cache is only
    /// valid for a single set of coordinates.
    pub fn evaluate(
        &self,
        var_idx: u32,
        coords: &[F2Dot14],
        out: &mut [f32],
        mut scalar_cache: Option<&mut [f32]>,
    ) -> Result<(), ReadError> {
        out.fill(0.0);
        if var_idx == NO_VARIATION_INDEX {
            return Ok(());
        }
        let (data, deltas) = self.delta_set(var_idx)?;
        let width = out.len();
        let expected = data.region_indices.len() * width;
        if deltas.len() != expected {
            return Err(ReadError::TupleWidthMismatch {
                var_idx,
                expected,
                actual: deltas.len(),
            });
        }
        let mut values = deltas.iter();
        for region_index in data.region_indices {
            let scalar = self
                .region_scalar(region_index.get() as usize, coords, scalar_cache.as_deref_mut())
                .ok_or(ReadError::InvalidVarIdx(var_idx))?;
            let region_values = values.by_ref().take(width);
            if scalar == 0.0 {
                region_values.for_each(drop);
                continue;
            }
            for (slot, delta) in out.iter_mut().zip(region_values) {
                *slot += delta as f32 * scalar;
            }
        }
        Ok(())
    }

    /// Computes the interpolated tuple for `var_idx`, inferring the tuple
    /// width from the stored delta set.
    ///
    /// [`NO_VARIATION_INDEX`] produces an empty tuple.
    pub fn evaluate_tuple(&self, var_idx: u32, coords: &[F2Dot14]) -> Result<Vec<f32>, ReadError> {
        if var_idx == NO_VARIATION_INDEX {
            return Ok(Vec::new());
        }
        let mut out = alloc::vec![0.0; self.tuple_width(var_idx)?];
        self.evaluate(var_idx, coords, &mut out, None)?;
        Ok(out)
    }

    /// The number of values per region in the delta set for `var_idx`.
    pub fn tuple_width(&self, var_idx: u32) -> Result<usize, ReadError> {
        let (data, deltas) = self.delta_set(var_idx)?;
        let region_count = data.region_indices.len();
        if region_count == 0 {
            return Ok(0);
        }
        if deltas.len() % region_count != 0 {
            return Err(ReadError::TupleWidthMismatch {
                var_idx,
                expected: (deltas.len() / region_count + 1) * region_count,
                actual: deltas.len(),
            });
        }
        Ok(deltas.len() / region_count)
    }

    fn delta_set(
        &self,
        var_idx: u32,
    ) -> Result<(&MultiItemVariationData<'a>, TupleValues<'a>), ReadError> {
        let outer = (var_idx >> 16) as usize;
        let inner = (var_idx & 0xFFFF) as usize;
        let data = self
            .variation_data
            .get(outer)
            .ok_or(ReadError::InvalidVarIdx(var_idx))?;
        let deltas = data.delta_set(inner).map_err(|e| match e {
            ReadError::IndexOutOfRange { .. } => ReadError::InvalidVarIdx(var_idx),
            e => e,
        })?;
        Ok((data, deltas))
    }

    fn region_scalar(
        &self,
        region_index: usize,
        coords: &[F2Dot14],
        cache: Option<&mut [f32]>,
    ) -> Option<f32> {
        let region = self.regions.get(region_index)?;
        match cache.and_then(|cache| cache.get_mut(region_index)) {
            Some(slot) if *slot <= 1.0 => Some(*slot),
            Some(slot) => {
                *slot = region.compute_scalar(coords);
                Some(*slot)
            }
            None => Some(region.compute_scalar(coords)),
        }
    }
}

/// A block of delta sets that share a list of regions.
#[derive(Clone, Debug)]
pub struct MultiItemVariationData<'a> {
    region_indices: &'a [BigEndian<u16>],
    delta_sets: Index2<'a>,
}

impl<'a> FontRead<'a> for MultiItemVariationData<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format as _));
        }
        let region_count: u16 = cursor.read()?;
        let region_indices = cursor.read_array::<u16>(region_count as usize)?;
        let delta_sets = data.read_subtable(cursor.position())?;
        Ok(Self {
            region_indices,
            delta_sets,
        })
    }
}

impl<'a> MultiItemVariationData<'a> {
    /// Indices into the store's region list.
    pub fn region_indices(&self) -> &'a [BigEndian<u16>] {
        self.region_indices
    }

    /// The number of delta sets in this block.
    pub fn delta_set_count(&self) -> u32 {
        self.delta_sets.count()
    }

    /// Read a specific delta set.
    ///
    /// The values are ordered region by region, following [`Self::region_indices`].
    pub fn delta_set(&self, i: usize) -> Result<TupleValues<'a>, ReadError> {
        TupleValues::read_to_end(self.delta_sets.get(i)?)
    }
}

/// A region that only lists the axes it depends on.
#[derive(Clone, Debug)]
pub struct SparseRegion<'a> {
    axes: &'a [RegionAxis],
}

impl<'a> FontRead<'a> for SparseRegion<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(0)?;
        let len = count as usize * std::mem::size_of::<RegionAxis>();
        let bytes = data
            .slice(2..2 + len)
            .ok_or(ReadError::TruncatedInput(data.absolute(2)))?;
        let axes = bytemuck::try_cast_slice(bytes.as_bytes())
            .map_err(|_| ReadError::MalformedData("bad region axis array"))?;
        Ok(Self { axes })
    }
}

impl SparseRegion<'_> {
    pub fn axes(&self) -> &[RegionAxis] {
        self.axes
    }

    /// Computes the scalar for this region at the given normalized coordinates.
    ///
    /// This is the product of the per-axis [tent](RegionAxis::tent) factors;
    /// axes that are not part of the region do not contribute.
    pub fn compute_scalar(&self, coords: &[F2Dot14]) -> f32 {
        let mut scalar = 1.0f32;
        for axis in self.axes {
            let coord = coords
                .get(axis.axis_index() as usize)
                .copied()
                .unwrap_or_default();
            let factor = axis.tent(coord);
            if factor == 0.0 {
                return 0.0;
            }
            scalar *= factor;
        }
        scalar
    }
}

/// The support of a region along a single axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck_derive::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct RegionAxis {
    axis_index: BigEndian<u16>,
    start: BigEndian<F2Dot14>,
    peak: BigEndian<F2Dot14>,
    end: BigEndian<F2Dot14>,
}

impl RegionAxis {
    pub fn axis_index(&self) -> u16 {
        self.axis_index.get()
    }

    pub fn start(&self) -> F2Dot14 {
        self.start.get()
    }

    pub fn peak(&self) -> F2Dot14 {
        self.peak.get()
    }

    pub fn end(&self) -> F2Dot14 {
        self.end.get()
    }

    /// The piecewise linear support factor at `coord`.
    ///
    /// Zero outside of `start..end`, one at `peak` and linear in between.
    /// Triples that are out of order, and the all-zero triple, do not
    /// constrain the region and produce one.
    pub fn tent(&self, coord: F2Dot14) -> f32 {
        let start = self.start().to_bits() as i32;
        let peak = self.peak().to_bits() as i32;
        let end = self.end().to_bits() as i32;
        let coord = coord.to_bits() as i32;
        if start > peak || peak > end {
            return 1.0;
        }
        if start == end {
            return if peak == 0 || coord == peak { 1.0 } else { 0.0 };
        }
        if coord == peak {
            1.0
        } else if coord <= start || coord >= end {
            0.0
        } else if coord < peak {
            (coord - start) as f32 / (peak - start) as f32
        } else {
            (end - coord) as f32 / (end - peak) as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn f2(v: f32) -> F2Dot14 {
        F2Dot14::from_f32(v)
    }

    fn region_axis(axis: u16, start: f32, peak: f32, end: f32) -> RegionAxis {
        RegionAxis {
            axis_index: axis.into(),
            start: f2(start).into(),
            peak: f2(peak).into(),
            end: f2(end).into(),
        }
    }

    #[test]
    fn tent_around_default() {
        let axis = region_axis(0, -1.0, 0.0, 1.0);
        assert_eq!(axis.tent(f2(0.0)), 1.0);
        assert_eq!(axis.tent(f2(-1.0)), 0.0);
        assert_eq!(axis.tent(f2(1.0)), 0.0);
        assert_eq!(axis.tent(f2(0.5)), 0.5);
        assert_eq!(axis.tent(f2(-0.25)), 0.75);
    }

    #[test]
    fn tent_positive() {
        let axis = region_axis(0, 0.0, 0.5, 1.0);
        assert_eq!(axis.tent(f2(0.0)), 0.0);
        assert_eq!(axis.tent(f2(0.25)), 0.5);
        assert_eq!(axis.tent(f2(0.5)), 1.0);
        assert_eq!(axis.tent(f2(0.75)), 0.5);
        assert_eq!(axis.tent(f2(-0.5)), 0.0);
        // peak at the edge of the range
        let axis = region_axis(0, 0.0, 1.0, 1.0);
        assert_eq!(axis.tent(f2(1.0)), 1.0);
        assert_eq!(axis.tent(f2(0.5)), 0.5);
    }

    #[test]
    fn tent_degenerate() {
        // out of order: ignored
        assert_eq!(region_axis(0, 0.5, 0.2, 1.0).tent(f2(-1.0)), 1.0);
        // all zero: ignored
        assert_eq!(region_axis(0, 0.0, 0.0, 0.0).tent(f2(0.7)), 1.0);
        // single point of support
        let point = region_axis(0, 0.5, 0.5, 0.5);
        assert_eq!(point.tent(f2(0.5)), 1.0);
        assert_eq!(point.tent(f2(0.4)), 0.0);
    }

    #[test]
    fn region_scalar_is_product() {
        let axes = [region_axis(0, 0.0, 1.0, 1.0), region_axis(2, -1.0, -1.0, 0.0)];
        let region = SparseRegion { axes: &axes };
        assert_eq!(region.compute_scalar(&[f2(0.5), f2(0.9), f2(-0.5)]), 0.25);
        // missing coordinates are at the default, where axis 0 has no support
        assert_eq!(region.compute_scalar(&[]), 0.0);
        // axis 1 is not part of the region
        assert_eq!(region.compute_scalar(&[f2(1.0), f2(-1.0), f2(-1.0)]), 1.0);
    }

    /// A store with two regions (wght+ and wdth-) and one block.
    ///
    /// The block has two delta sets of width two:
    /// - 0: [100, 10] at wght+, [-50, 0] at wdth-
    /// - 1: [1, 2] at wght+, [3] at wdth- (malformed)
    fn two_region_store() -> BeBuffer {
        BeBuffer::new()
            // header
            .push(1u16)
            .push_with_tag(0u32, "region_list")
            .push(1u16)
            .push_with_tag(0u32, "data0")
            // region list
            .tag("region_list_start")
            .push(2u16)
            .push_with_tag(0u32, "region0")
            .push_with_tag(0u32, "region1")
            .tag("region0_start")
            .push(1u16)
            .extend([0u16])
            .extend([f2(0.0), f2(1.0), f2(1.0)])
            .tag("region1_start")
            .push(1u16)
            .extend([1u16])
            .extend([f2(-1.0), f2(-1.0), f2(0.0)])
            // variation data
            .tag("data0_start")
            .push(1u16)
            .push(2u16)
            .extend([0u16, 1])
            // index of two delta sets
            .push(2u32)
            .push(1u8)
            .extend([1u8, 6, 10])
            // [100, 10, -50, 0] as one byte run
            .extend([0x03u8, 100, 10, 0xce, 0])
            // [1, 2, 3]
            .extend([0x02u8, 1, 2, 3])
    }

    fn finish(mut buf: BeBuffer) -> BeBuffer {
        let region_list = buf.offset_for("region_list_start") as u32;
        let data0 = buf.offset_for("data0_start") as u32;
        let region0 = (buf.offset_for("region0_start") - region_list as usize) as u32;
        let region1 = (buf.offset_for("region1_start") - region_list as usize) as u32;
        buf.write_at("region_list", region_list);
        buf.write_at("data0", data0);
        buf.write_at("region0", region0);
        buf.write_at("region1", region1);
        buf
    }

    #[test]
    fn read_store() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        assert_eq!(store.region_count(), 2);
        assert_eq!(store.variation_data().len(), 1);
        let data = &store.variation_data()[0];
        assert_eq!(data.delta_set_count(), 2);
        assert_eq!(
            data.delta_set(0).unwrap().iter().collect::<Vec<_>>(),
            [100, 10, -50, 0]
        );
    }

    #[test]
    fn evaluate_blends_regions() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        let mut out = [0.0f32; 2];
        // default: no deltas
        store.evaluate(0, &[], &mut out, None).unwrap();
        assert_eq!(out, [0.0, 0.0]);
        // full wght
        store.evaluate(0, &[f2(1.0)], &mut out, None).unwrap();
        assert_eq!(out, [100.0, 10.0]);
        // half wght, full negative wdth
        store
            .evaluate(0, &[f2(0.5), f2(-1.0)], &mut out, None)
            .unwrap();
        assert_eq!(out, [0.0, 5.0]);
        assert_eq!(
            store.evaluate_tuple(0, &[f2(0.5), f2(-1.0)]).unwrap(),
            [0.0, 5.0]
        );
    }

    #[test]
    fn evaluate_with_cache() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        let coords = [f2(0.5), f2(-0.5)];
        let mut cache = vec![SCALAR_NOT_CACHED; store.region_count()];
        let mut out = [0.0f32; 2];
        store
            .evaluate(0, &coords, &mut out, Some(&mut cache))
            .unwrap();
        assert_eq!(cache, [0.5, 0.5]);
        assert_eq!(out, [25.0, 5.0]);
        // cached values are used as is
        cache[0] = 1.0;
        store
            .evaluate(0, &coords, &mut out, Some(&mut cache))
            .unwrap();
        assert_eq!(out, [75.0, 10.0]);
    }

    #[test]
    fn no_variation_index_is_zero() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        let mut out = [7.0f32; 3];
        store
            .evaluate(NO_VARIATION_INDEX, &[f2(1.0)], &mut out, None)
            .unwrap();
        assert_eq!(out, [0.0; 3]);
    }

    #[test]
    fn invalid_indices() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        let mut out = [0.0f32; 2];
        assert_eq!(
            store.evaluate(0x0001_0000, &[], &mut out, None),
            Err(ReadError::InvalidVarIdx(0x0001_0000))
        );
        assert_eq!(
            store.evaluate(2, &[], &mut out, None),
            Err(ReadError::InvalidVarIdx(2))
        );
    }

    #[test]
    fn width_mismatch() {
        let buf = finish(two_region_store());
        let store = MultiItemVariationStore::read(buf.font_data()).unwrap();
        let mut out = [0.0f32; 3];
        assert_eq!(
            store.evaluate(0, &[], &mut out, None),
            Err(ReadError::TupleWidthMismatch {
                var_idx: 0,
                expected: 6,
                actual: 4
            })
        );
        let mut out = [0.0f32; 2];
        assert_eq!(
            store.evaluate(1, &[], &mut out, None),
            Err(ReadError::TupleWidthMismatch {
                var_idx: 1,
                expected: 4,
                actual: 3
            })
        );
        assert!(store.tuple_width(1).is_err());
        assert_eq!(store.tuple_width(0), Ok(2));
    }

    #[test]
    fn bad_format() {
        let buf = BeBuffer::new().push(2u16).push(0u32).push(0u16);
        assert_eq!(
            MultiItemVariationStore::read(buf.font_data()).unwrap_err(),
            ReadError::InvalidFormat(2)
        );
    }
}
