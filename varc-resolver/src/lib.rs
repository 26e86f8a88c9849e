//! Resolving variable composite glyphs
//!
//! A glyph in the `VARC` table is a list of components, each placing another
//! glyph with an affine transform and a location in design space. Components
//! can themselves be composites. The [`Resolver`] walks this tree for a
//! requested glyph and location and produces the flat list of leaf glyphs to
//! draw, in order.
//!
//! # Example
//!
//! ```no_run
//! # let (varc_bytes, axis_indices_bytes) = (Vec::<u8>::new(), Vec::<u8>::new());
//! use varc_resolver::{AxisContext, Resolver};
//! use read_varc::types::{F2Dot14, GlyphId};
//!
//! let resolver = Resolver::from_bytes(&varc_bytes, &axis_indices_bytes).unwrap();
//! let bold = AxisContext::new().with(0, F2Dot14::ONE);
//! if let Some(placements) = resolver.resolve(GlyphId::new(42), &bold).unwrap() {
//!     for placement in placements {
//!         println!("{} {:?}", placement.glyph_id, placement.transform);
//!     }
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod context;
mod error;
pub mod pen;
mod resolve;
mod transform;

pub use context::AxisContext;
pub use error::ResolveError;
pub use resolve::{
    Placement, PlacementSink, Resolver, ResolverSettings, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_PLACEMENTS,
};
pub use transform::Affine;

/// Public re-export of the read-varc crate.
pub extern crate read_varc as raw;
