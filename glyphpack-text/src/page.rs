//! Atlas pages and the single-page build pass.
//!
//! An [`AtlasPageBuilder`] owns one canvas-sized bitmap and one
//! [`RectanglePacker`]. It walks a work list of characters in order:
//!
//! 1. measure the character through the [`GlyphMetricsSource`]
//! 2. grow the natural size into a padded cell
//! 3. ask the packer for the cell
//! 4. on success draw the glyph at the cell interior and record it;
//!    on "no room" hand the character back as leftover;
//!    on "never fits" hand it back as oversized
//!
//! The caller ([`FontAtlasManager`](crate::manager::FontAtlasManager))
//! decides what to do with leftovers and oversized characters.

use glyphpack_core::{Bitmap, PackError, Rect, RectanglePacker, Size, UvRect};
use rustc_hash::FxHashSet;

use crate::source::{FontMetrics, GlyphMetricsSource, GlyphSize, SourceError};
use crate::style::{StyleAttributes, FALLBACK_CHAR};

/// Where one character lives in the atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphRecord {
    pub ch: char,
    /// Index of the owning page.
    pub page: usize,
    /// Packed cell on the page, padding included.
    pub cell: Rect,
    /// The glyph's natural-size rect inside the cell.
    pub glyph: Rect,
    /// `cell` in normalized page coordinates, inset by half a texel.
    pub uv: UvRect,
}

impl GlyphRecord {
    /// Natural pixel size (may be smaller than the cell).
    #[inline(always)]
    pub fn size(&self) -> GlyphSize {
        self.glyph.size()
    }

    /// Horizontal advance in pixels.
    #[inline(always)]
    pub fn advance(&self) -> u32 {
        self.glyph.width
    }

    /// Glyphs narrower than a pixel reserve a slot but draw nothing.
    #[inline(always)]
    pub fn is_visible(&self) -> bool {
        !self.glyph.size().is_empty()
    }
}

/// A finished page: index, size and bitmap. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasPage {
    index: usize,
    bitmap: Bitmap,
}

impl AtlasPage {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline(always)]
    pub fn size(&self) -> Size {
        self.bitmap.size()
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// RGBA bytes ready for a texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        self.bitmap.as_bytes()
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }
}

/// Outcome of one page pass.
#[derive(Debug)]
pub struct PagePass {
    pub page: AtlasPage,
    /// Placed glyphs, in input order.
    pub placed: Vec<GlyphRecord>,
    /// Characters that fit an empty page of this size but not this one.
    pub leftover: Vec<char>,
    /// Characters whose cell exceeds this page's canvas, with that cell size.
    pub oversized: Vec<(char, Size)>,
}

/// Builds a single atlas page.
pub struct AtlasPageBuilder<'a> {
    index: usize,
    packer: RectanglePacker,
    bitmap: Bitmap,
    style: &'a StyleAttributes,
    metrics: FontMetrics,
    /// Measured width of the fallback glyph, looked up on first need.
    space_width: Option<u32>,
}

impl<'a> AtlasPageBuilder<'a> {
    /// Start page `index` with a transparent `canvas`-sized bitmap.
    pub fn new(index: usize, canvas: Size, style: &'a StyleAttributes, metrics: FontMetrics) -> Self {
        Self {
            index,
            packer: RectanglePacker::new(canvas),
            bitmap: Bitmap::new(canvas),
            style,
            metrics,
            space_width: None,
        }
    }

    pub fn canvas(&self) -> Size {
        self.packer.canvas()
    }

    /// Padded cell size for a glyph of `natural` size.
    ///
    /// `slot_width` replaces the natural width for glyphs under a pixel wide.
    fn cell_size(&self, natural: GlyphSize, slot_width: u32) -> Size {
        let padding = &self.style.padding;
        let height = natural.height.max(self.metrics.line_height).max(1);
        Size::new(
            slot_width.saturating_add(padding.horizontal()),
            height.saturating_add(padding.vertical()),
        )
    }

    fn space_width<S>(&mut self, source: &mut S) -> Result<u32, SourceError>
    where
        S: GlyphMetricsSource + ?Sized,
    {
        if let Some(width) = self.space_width {
            return Ok(width);
        }
        let width = source.measure(FALLBACK_CHAR, self.style)?.width.max(1);
        self.space_width = Some(width);
        Ok(width)
    }

    /// Try to place every character of `chars` on this page.
    ///
    /// Duplicates are attempted once. A source error aborts the pass.
    pub fn place_all<S>(mut self, source: &mut S, chars: &[char]) -> Result<PagePass, SourceError>
    where
        S: GlyphMetricsSource + ?Sized,
    {
        let mut seen = FxHashSet::default();
        let mut placed = Vec::new();
        let mut leftover = Vec::new();
        let mut oversized = Vec::new();
        let canvas = self.canvas();

        for &ch in chars {
            if !seen.insert(ch) {
                continue;
            }

            let natural = source.measure(ch, self.style)?;
            let slot_width = if natural.width >= 1 {
                natural.width
            } else {
                self.space_width(source)?
            };
            let cell_size = self.cell_size(natural, slot_width);

            match self.packer.allocate(cell_size) {
                Ok(cell) => {
                    let padding = &self.style.padding;
                    let glyph = cell.inset_origin(padding.left, padding.top, natural);
                    let record = GlyphRecord {
                        ch,
                        page: self.index,
                        cell,
                        glyph,
                        uv: UvRect::from_pixels(&cell, canvas),
                    };
                    if record.is_visible() {
                        source.render(ch, self.style, &mut self.bitmap, cell, glyph)?;
                    }
                    placed.push(record);
                }
                Err(PackError::NoRoom(_)) => leftover.push(ch),
                Err(PackError::NeverFits { request, .. }) => oversized.push((ch, request)),
            }
        }

        log::debug!(
            "Page {} ({}x{}): placed {}, leftover {}, oversized {}",
            self.index,
            canvas.width,
            canvas.height,
            placed.len(),
            leftover.len(),
            oversized.len()
        );

        Ok(PagePass {
            page: AtlasPage {
                index: self.index,
                bitmap: self.bitmap,
            },
            placed,
            leftover,
            oversized,
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
