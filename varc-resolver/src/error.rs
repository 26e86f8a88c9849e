//! Errors that may occur when resolving composite glyphs.

use core::fmt;
use read_varc::{types::GlyphId, ReadError};

/// Errors that may occur when resolving or drawing a glyph.
///
/// Errors are scoped to the requested glyph: the resolver is left unchanged
/// and other glyphs can still be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// A composite glyph refers to itself, directly or indirectly, or the
    /// component tree is deeper than the configured limit.
    RecursionLimitExceeded(GlyphId),
    /// The requested glyph expands to more components than the configured
    /// limit.
    TooManyPlacements(GlyphId),
    /// The outline provider has no outline for a leaf glyph.
    OutlineUnavailable(GlyphId),
    /// The record for a composite glyph could not be read.
    Read { glyph_id: GlyphId, error: ReadError },
}

impl ResolveError {
    pub(crate) fn read(glyph_id: GlyphId) -> impl FnOnce(ReadError) -> Self {
        move |error| Self::Read { glyph_id, error }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RecursionLimitExceeded(gid) => write!(
                f,
                "Recursion limit exceeded when loading composite component {gid}"
            ),
            Self::TooManyPlacements(gid) => {
                write!(f, "Glyph {gid} expands to too many components")
            }
            Self::OutlineUnavailable(gid) => write!(f, "No outline available for glyph {gid}"),
            Self::Read { glyph_id, error } => {
                write!(f, "Error reading composite glyph {glyph_id}: {error}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}
