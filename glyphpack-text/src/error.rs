//! Error types for atlas builds.

use glyphpack_core::Size;
use thiserror::Error;

use crate::source::SourceError;

/// Which page dimension a limit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AtlasError {
    /// A padded glyph cell exceeds the maximum page size. Only raised for
    /// the fallback character; other glyphs are recorded as unresolved.
    #[error("glyph {ch:?} needs a {}x{} cell but pages are limited to {}x{}", .cell.width, .cell.height, .max.width, .max.height)]
    GlyphTooLarge { ch: char, cell: Size, max: Size },

    /// Two consecutive passes left the same characters unplaced. Only
    /// raised when the fallback character is among them.
    #[error("packing stalled with {} characters left", .remaining.len())]
    SizingStall { remaining: Vec<char> },

    #[error("glyph source failed: {0}")]
    Measurement(#[from] SourceError),

    #[error("page {axis} {value} is outside 1..={max}")]
    InvalidPageSize { axis: Axis, value: u32, max: u32 },

    #[error("glyph {0:?} not found and no fallback glyph is available")]
    GlyphNotFound(char),

    #[error("a font named '{0}' is already loaded")]
    DuplicateFont(String),
}
