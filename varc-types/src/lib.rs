//! Common scalar data types used by variable composite glyph tables
//!
//! These follow the OpenType [data types], with the addition of the
//! `F4Dot12` and `F6Dot10` fixed-point formats used for component
//! transforms.
//!
//! [data types]: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types

#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

mod fixed;
mod fword;
mod glyph_id;
mod raw;
mod uint24;

#[cfg(all(test, feature = "serde"))]
mod serde_test;

pub use fixed::{F2Dot14, F4Dot12, F6Dot10};
pub use fword::FWord;
pub use glyph_id::{GlyphId, GlyphId16, TryFromGlyphIdError};
pub use raw::{BigEndian, Scalar};
pub use uint24::Uint24;
