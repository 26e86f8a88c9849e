//! 16-bit fixed-point numerical types

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

macro_rules! fixed_impl {
    ($name:ident, $fract_bits:literal) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[doc = concat!("16-bit signed fixed point number with ", stringify!($fract_bits), " bits of fraction.")]
        #[repr(transparent)]
        pub struct $name(i16);

        impl $name {
            /// Minimum value.
            pub const MIN: Self = Self(i16::MIN);

            /// Maximum value.
            pub const MAX: Self = Self(i16::MAX);

            /// This type's smallest representable value
            pub const EPSILON: Self = Self(1);

            /// Representation of 0.0.
            pub const ZERO: Self = Self(0);

            /// Representation of 1.0.
            pub const ONE: Self = Self(1 << $fract_bits);

            const FRACT_BITS: u32 = $fract_bits;
            const SCALE: f32 = (1 << $fract_bits) as f32;

            /// Creates a new fixed point value from the underlying bit representation.
            #[inline(always)]
            pub const fn from_bits(bits: i16) -> Self {
                Self(bits)
            }

            /// Returns the underlying bit representation of the value.
            #[inline(always)]
            pub const fn to_bits(self) -> i16 {
                self.0
            }

            /// Creates a fixed point value from a 32-bit integer holding
            /// raw units, saturating at the bounds of the type.
            pub const fn from_bits_saturating(bits: i32) -> Self {
                if bits > i16::MAX as i32 {
                    Self::MAX
                } else if bits < i16::MIN as i32 {
                    Self::MIN
                } else {
                    Self(bits as i16)
                }
            }

            /// Creates a fixed point value from a 32-bit float.
            ///
            /// This operation is lossy; the float will be rounded to the nearest
            /// representable value, saturating at the bounds of the type.
            pub fn from_f32(x: f32) -> Self {
                let scaled = x * Self::SCALE;
                #[cfg(any(feature = "std", test))]
                let rounded = scaled.round();
                // round half away from zero without std
                #[cfg(all(not(feature = "std"), not(test)))]
                let rounded = scaled + if scaled < 0.0 { -0.5 } else { 0.5 };
                // float to int casts saturate
                Self(rounded as i16)
            }

            /// Returns the value as a 32-bit float.
            ///
            /// This operation is lossless: all representable values can be
            /// round-tripped.
            #[inline(always)]
            pub fn to_f32(self) -> f32 {
                self.0 as f32 / Self::SCALE
            }

            /// Returns the value as a 64-bit float.
            pub fn to_f64(self) -> f64 {
                self.0 as f64 / (1i32 << Self::FRACT_BITS) as f64
            }

            /// Saturating addition.
            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Saturating subtraction.
            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Returns the value in big-endian byte order.
            pub const fn to_be_bytes(self) -> [u8; 2] {
                self.0.to_be_bytes()
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline(always)]
            fn add(self, other: Self) -> Self {
                // same overflow semantics as std: panic in debug, wrap in release
                Self(self.0 + other.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, other: Self) {
                *self = *self + other;
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline(always)]
            fn sub(self, other: Self) -> Self {
                Self(self.0 - other.0)
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, other: Self) {
                *self = *self - other;
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline(always)]
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.to_f64(), f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Display::fmt(self, f)
            }
        }

        crate::raw::newtype_scalar!($name, [u8; 2]);
    };
}

fixed_impl!(F2Dot14, 14);
fixed_impl!(F4Dot12, 12);
fixed_impl!(F6Dot10, 10);

impl F2Dot14 {
    /// Clamps to the normalized coordinate range `[-1.0, 1.0]`.
    pub fn clamp_normalized(self) -> Self {
        Self(self.0.clamp(-(1 << 14), 1 << 14))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f2dot14_floats() {
        // Examples from https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types
        assert_eq!(F2Dot14(0x7fff), F2Dot14::from_f32(1.999939));
        assert_eq!(F2Dot14(0x7000), F2Dot14::from_f32(1.75));
        assert_eq!(F2Dot14(0x0001), F2Dot14::from_f32(0.0000610356));
        assert_eq!(F2Dot14(0x0000), F2Dot14::from_f32(0.0));
        assert_eq!(F2Dot14(-1), F2Dot14::from_f32(-0.000061));
        assert_eq!(F2Dot14(-0x8000), F2Dot14::from_f32(-2.0));
        assert_eq!(F2Dot14::from_f32(0.5).to_f32(), 0.5);
    }

    #[test]
    fn saturate_from_float() {
        assert_eq!(F2Dot14::from_f32(10.0), F2Dot14::MAX);
        assert_eq!(F2Dot14::from_f32(-10.0), F2Dot14::MIN);
        assert_eq!(F6Dot10::from_f32(40.0), F6Dot10::MAX);
    }

    #[test]
    fn transform_formats() {
        // a quarter turn, in units of pi
        assert_eq!(F4Dot12::from_f32(0.5).to_bits(), 0x0800);
        assert_eq!(F4Dot12::from_bits(-4096).to_f32(), -1.0);
        assert_eq!(F6Dot10::from_f32(2.0).to_bits(), 2048);
        assert_eq!(F6Dot10::ONE.to_f32(), 1.0);
        assert_eq!(F4Dot12::from_f32(7.99), F4Dot12::from_bits(32727));
    }

    #[test]
    fn saturating_bits() {
        assert_eq!(F2Dot14::from_bits_saturating(1 << 20), F2Dot14::MAX);
        assert_eq!(F2Dot14::from_bits_saturating(-(1 << 20)), F2Dot14::MIN);
        assert_eq!(F2Dot14::from_bits_saturating(-5).to_bits(), -5);
    }

    #[test]
    fn clamp_normalized() {
        assert_eq!(F2Dot14::from_f32(1.5).clamp_normalized(), F2Dot14::ONE);
        assert_eq!(F2Dot14::from_f32(-1.5).clamp_normalized(), -F2Dot14::ONE);
        assert_eq!(F2Dot14::from_f32(0.25).clamp_normalized().to_f32(), 0.25);
    }
}
