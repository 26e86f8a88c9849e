//! Locations in design space.

use read_varc::types::F2Dot14;

/// Normalized coordinates, indexed by axis.
///
/// Axes that have not been set are at the default location, zero. Trailing
/// default coordinates are never stored, so two contexts compare equal when
/// they describe the same location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AxisContext {
    coords: Vec<F2Dot14>,
}

impl AxisContext {
    /// The default location.
    pub fn new() -> Self {
        Self::default()
    }

    /// A location from coordinates in axis order.
    pub fn from_coords(coords: &[F2Dot14]) -> Self {
        let mut context = Self {
            coords: coords.to_vec(),
        };
        context.trim();
        context
    }

    /// Returns this location with `axis` moved to `coord`.
    pub fn with(mut self, axis: u16, coord: F2Dot14) -> Self {
        self.set(axis, coord);
        self
    }

    /// The coordinate on `axis`.
    pub fn get(&self, axis: u16) -> F2Dot14 {
        self.coords
            .get(axis as usize)
            .copied()
            .unwrap_or(F2Dot14::ZERO)
    }

    pub fn set(&mut self, axis: u16, coord: F2Dot14) {
        let axis = axis as usize;
        if axis >= self.coords.len() {
            if coord == F2Dot14::ZERO {
                return;
            }
            self.coords.resize(axis + 1, F2Dot14::ZERO);
        }
        self.coords[axis] = coord;
        self.trim();
    }

    /// The stored coordinates; axes past the end are at the default.
    pub fn coords(&self) -> &[F2Dot14] {
        &self.coords
    }

    /// Returns `true` if every axis is at the default.
    pub fn is_default(&self) -> bool {
        self.coords.is_empty()
    }

    fn trim(&mut self) {
        while self.coords.last() == Some(&F2Dot14::ZERO) {
            self.coords.pop();
        }
    }
}

impl FromIterator<(u16, F2Dot14)> for AxisContext {
    fn from_iter<T: IntoIterator<Item = (u16, F2Dot14)>>(iter: T) -> Self {
        let mut context = Self::new();
        for (axis, coord) in iter {
            context.set(axis, coord);
        }
        context
    }
}
