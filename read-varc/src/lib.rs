//! Reading variable composite glyph tables
//!
//! This crate provides memory safe parsing of the `VARC` table and the
//! structures it depends on. Lookups into the table are lazy: records are
//! only decoded when requested, and the raw bytes are never copied.
//!
//! The root [`tables`] module contains a submodule for each structure:
//!
//! - [`tables::index`]: 32-bit counted indices of variable sized items
//! - [`tables::coverage`]: glyph coverage
//! - [`tables::variations`]: packed tuple values
//! - [`tables::mivs`]: the multi-item variation store and its evaluator
//! - [`tables::varc`]: the table itself and the variable component records
//!
//! # Example
//!
//! ```no_run
//! # let varc_bytes: Vec<u8> = Vec::new();
//! use read_varc::{tables::varc::Varc, FontData, FontRead};
//! let varc = Varc::read(FontData::new(&varc_bytes)).unwrap();
//! for gid in varc.coverage().unwrap().iter() {
//!     println!("{gid} is a variable composite");
//! }
//! ```
//!
//! For recursive resolution of composite glyphs, see the `varc-resolver`
//! crate.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

extern crate alloc;

mod font_data;
mod read;
pub mod tables;
pub mod var_int;

#[cfg(test)]
#[path = "tests/test_helpers.rs"]
mod test_helpers;

pub use font_data::{Cursor, FontData};
pub use read::{FontRead, ReadError};

/// Public re-export of the varc-types crate.
pub extern crate varc_types as types;
