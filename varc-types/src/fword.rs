//! 16-bit signed font-units

/// 16-bit signed quantity in font design units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FWord(i16);

impl FWord {
    pub const fn new(raw: i16) -> Self {
        Self(raw)
    }

    pub const fn to_i16(self) -> i16 {
        self.0
    }

    /// Saturating conversion from a rounded float.
    pub fn from_f32_saturating(value: f32) -> Self {
        #[cfg(any(feature = "std", test))]
        let value = value.round();
        #[cfg(all(not(feature = "std"), not(test)))]
        let value = value + if value < 0.0 { -0.5 } else { 0.5 };
        Self(value as i16)
    }
}

impl From<i16> for FWord {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

impl From<FWord> for i32 {
    fn from(value: FWord) -> Self {
        value.0 as i32
    }
}

impl std::fmt::Display for FWord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

crate::raw::newtype_scalar!(FWord, [u8; 2]);
