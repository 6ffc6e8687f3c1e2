//! The glyph source contract: measuring and rendering single characters.
//!
//! The atlas pipeline never touches fonts directly. Everything it needs
//! from a rasterizer goes through [`GlyphMetricsSource`]:
//!
//! - font-wide metrics, once per rebuild
//! - the natural pixel size of each character
//! - drawing a character into a sub-rect of a page bitmap

use glyphpack_core::{Bitmap, Rect, Size};
use thiserror::Error;

use crate::style::StyleAttributes;

/// Font-wide vertical metrics in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FontMetrics {
    pub line_height: u32,
    pub ascent: u32,
    pub descent: u32,
}

/// Natural pixel size of one glyph. Either dimension may be zero.
pub type GlyphSize = Size;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no font available for family '{0}'")]
    FontUnavailable(String),
    #[error("cannot rasterize {ch:?}: {reason}")]
    Glyph { ch: char, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Measures and draws glyphs for the atlas builder.
///
/// Methods take `&mut self` so implementations can keep shaping and
/// rasterization caches.
pub trait GlyphMetricsSource {
    /// Line height, ascent and descent for `style`.
    fn font_metrics(&mut self, style: &StyleAttributes) -> Result<FontMetrics, SourceError>;

    /// Natural pixel size of `ch` under `style`.
    fn measure(&mut self, ch: char, style: &StyleAttributes) -> Result<GlyphSize, SourceError>;

    /// Draw `ch` into `target` with its top-left corner at `dest`.
    ///
    /// `dest` has the measured natural size; `cell` is the padded cell
    /// around it. Implementations must not draw outside `cell`.
    fn render(
        &mut self,
        ch: char,
        style: &StyleAttributes,
        target: &mut Bitmap,
        cell: Rect,
        dest: Rect,
    ) -> Result<(), SourceError>;
}

impl<S: GlyphMetricsSource + ?Sized> GlyphMetricsSource for Box<S> {
    fn font_metrics(&mut self, style: &StyleAttributes) -> Result<FontMetrics, SourceError> {
        (**self).font_metrics(style)
    }

    fn measure(&mut self, ch: char, style: &StyleAttributes) -> Result<GlyphSize, SourceError> {
        (**self).measure(ch, style)
    }

    fn render(
        &mut self,
        ch: char,
        style: &StyleAttributes,
        target: &mut Bitmap,
        cell: Rect,
        dest: Rect,
    ) -> Result<(), SourceError> {
        (**self).render(ch, style, target, cell, dest)
    }
}
