//! Writing variable composite glyph tables
//!
//! This crate provides the encoders for the binary structures used by the
//! `VARC` table, and builders that assemble them into a complete table.
//!
//! Each structure implements [`FontWrite`], which describes how it is
//! serialized, and [`Validate`](validate::Validate), which checks the
//! constraints that can't be expressed in the type system (like a count
//! fitting in a `u16`). Subtables are referenced by offset; offsets are
//! resolved and identical subtables are shared when the root table is
//! passed to [`dump_table`].
//!
//! # Example
//!
//! ```
//! use write_varc::tables::varc::{VarComponent, VarcBuilder};
//! use write_varc::types::GlyphId;
//!
//! let mut builder = VarcBuilder::new();
//! builder.add_glyph(
//!     GlyphId::new(2),
//!     vec![VarComponent::new(GlyphId::new(1)).with_translate(10.0, 0.0)],
//! );
//! let compiled = builder.build().unwrap();
//! assert!(!compiled.varc.is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
mod graph;
pub mod tables;
pub mod validate;
mod write;

pub use error::Error;
pub use write::{dump_table, FontWrite, TableWriter};

/// Public re-export of the varc-types crate.
pub extern crate varc_types as types;

/// Public re-export of the read-varc crate.
pub extern crate read_varc as read;
