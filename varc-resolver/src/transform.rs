//! Affine transforms for placed glyphs.

use read_varc::tables::varc::mul_matrix;

/// A 2x3 affine matrix.
///
/// The coefficients `[a, b, c, d, e, f]` map a point as
///
/// ```text
/// | a c e |   | x |
/// | b d f | * | y |
/// | 0 0 1 |   | 1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine([f32; 6]);

impl Affine {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub const fn new(coeffs: [f32; 6]) -> Self {
        Self(coeffs)
    }

    pub const fn translate(x: f32, y: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, x, y])
    }

    pub const fn scale(x: f32, y: f32) -> Self {
        Self([x, 0.0, 0.0, y, 0.0, 0.0])
    }

    pub const fn as_coeffs(&self) -> [f32; 6] {
        self.0
    }

    /// The transform that applies `inner` first and then `self`.
    pub fn pre_transform(&self, inner: Affine) -> Affine {
        Self(mul_matrix(self.0, inner.0))
    }

    #[inline(always)]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 6]> for Affine {
    fn from(coeffs: [f32; 6]) -> Self {
        Self(coeffs)
    }
}

impl core::ops::Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        self.pre_transform(rhs)
    }
}

#[cfg(feature = "kurbo")]
impl From<Affine> for kurbo::Affine {
    fn from(value: Affine) -> Self {
        kurbo::Affine::new(value.0.map(|coeff| coeff as f64))
    }
}
