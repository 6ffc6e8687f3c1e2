//! Multi-page atlas builds for one font.
//!
//! [`FontAtlasManager`] owns the style, the character set and the built
//! result (pages, glyph table, metrics). Setters only mark the atlas dirty;
//! [`rebuild`](FontAtlasManager::rebuild) does the work:
//!
//! ```text
//!  Clean ──setter──▸ Dirty ──rebuild──▸ Measuring ──▸ Packing ──▸ Clean
//!                      ▲                                 │
//!                      └────────── error (old result kept)
//! ```
//!
//! Packing runs page passes over a worklist. Characters that did not fit
//! the remaining room go to the next page. Characters whose cell is larger
//! than a heuristic-sized page are retried on a page of the maximum size;
//! only when they exceed that too are they dropped as unresolved.

use std::sync::Arc;

use glyphpack_core::{Rgba8, Size};
use rustc_hash::FxHashMap;

use crate::error::{AtlasError, Axis};
use crate::paint::PaintSource;
use crate::page::{AtlasPage, AtlasPageBuilder, GlyphRecord, PagePass};
use crate::source::{FontMetrics, GlyphMetricsSource};
use crate::style::{
    clamp_font_size, clamp_outline_width, CharacterSet, DeviceCaps, Padding, PageLimits,
    StyleAttributes, FALLBACK_CHAR,
};

/// Cells per side assumed by the first-page size estimate.
const CANVAS_GRID: u32 = 16;

/// Receives finished pages after a successful rebuild, e.g. to upload them
/// as textures.
pub trait PageConsumer {
    fn consume(&mut self, page: &AtlasPage);
}

impl<F: FnMut(&AtlasPage)> PageConsumer for F {
    fn consume(&mut self, page: &AtlasPage) {
        self(page)
    }
}

/// Size of the first page of a build: a 16x16 grid of line-height cells,
/// limited to `limits` and rounded to a power of two when `caps` require it.
pub(crate) fn initial_canvas(
    metrics: &FontMetrics,
    padding: &Padding,
    limits: PageLimits,
    caps: &DeviceCaps,
) -> Size {
    let fit = |cell: u32, max: u32| {
        let max = max.max(1);
        let estimate = cell.saturating_mul(CANVAS_GRID).clamp(1, max);
        caps.round_extent(estimate).min(max).max(1)
    };
    Size::new(
        fit(metrics.line_height.saturating_add(padding.horizontal()), limits.max_width),
        fit(metrics.line_height.saturating_add(padding.vertical()), limits.max_height),
    )
}

/// A pass stalled when it placed nothing and handed back its whole input.
fn stalled(work: &[char], pass: &PagePass) -> bool {
    pass.placed.is_empty() && !pass.leftover.is_empty() && pass.leftover.len() == work.len()
}

/// Result of one successful build, swapped in all at once.
struct Built {
    metrics: FontMetrics,
    max_character_height: u32,
    pages: Vec<AtlasPage>,
    glyphs: FxHashMap<char, GlyphRecord>,
    unresolved: Vec<char>,
}

/// Builds a glyph atlas for one font and answers glyph lookups.
pub struct FontAtlasManager<S> {
    name: String,
    source: S,
    style: StyleAttributes,
    characters: CharacterSet,
    limits: PageLimits,
    caps: DeviceCaps,
    dirty: bool,
    metrics: FontMetrics,
    max_character_height: u32,
    pages: Vec<AtlasPage>,
    glyphs: FxHashMap<char, GlyphRecord>,
    unresolved: Vec<char>,
}

impl<S: GlyphMetricsSource> FontAtlasManager<S> {
    /// New, dirty manager with the default character set and page limits.
    pub fn new(name: impl Into<String>, source: S, style: StyleAttributes, caps: DeviceCaps) -> Self {
        Self {
            name: name.into(),
            source,
            style: style.sanitized(),
            characters: CharacterSet::default(),
            limits: PageLimits::default().fit_to(&caps),
            caps,
            dirty: true,
            metrics: FontMetrics::default(),
            max_character_height: 0,
            pages: Vec::new(),
            glyphs: FxHashMap::default(),
            unresolved: Vec::new(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &StyleAttributes {
        &self.style
    }

    pub fn characters(&self) -> &CharacterSet {
        &self.characters
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    pub fn caps(&self) -> &DeviceCaps {
        &self.caps
    }

    /// `true` when a setter ran since the last successful build.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn line_height(&self) -> u32 {
        self.metrics.line_height
    }

    pub fn ascent(&self) -> u32 {
        self.metrics.ascent
    }

    pub fn descent(&self) -> u32 {
        self.metrics.descent
    }

    /// Tallest natural glyph height, or the line height when all are blank.
    pub fn max_character_height(&self) -> u32 {
        self.max_character_height
    }

    /// Number of pages, i.e. textures a renderer has to hold.
    pub fn resource_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[AtlasPage] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&AtlasPage> {
        self.pages.get(index)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphRecord> {
        self.glyphs.values()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// `true` when `ch` itself has a record (no fallback).
    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Record for `ch`, or for the fallback character when `ch` is absent.
    pub fn get_glyph(&self, ch: char) -> Result<&GlyphRecord, AtlasError> {
        self.glyphs
            .get(&ch)
            .or_else(|| self.glyphs.get(&FALLBACK_CHAR))
            .ok_or(AtlasError::GlyphNotFound(ch))
    }

    /// Characters the last build could not place on any page.
    pub fn unresolved(&self) -> &[char] {
        &self.unresolved
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    // ── Setters ─────────────────────────────────────────────────────

    pub fn set_style(&mut self, style: StyleAttributes) {
        self.style = style.sanitized();
        self.dirty = true;
    }

    pub fn set_family(&mut self, family: impl Into<String>) {
        self.style.family = family.into();
        self.dirty = true;
    }

    /// Point size; negative values become 0.
    pub fn set_font_size(&mut self, size: f32) {
        self.style.font_size = clamp_font_size(size);
        self.dirty = true;
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.style.bold = bold;
        self.dirty = true;
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.style.italic = italic;
        self.dirty = true;
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.style.underline = underline;
        self.dirty = true;
    }

    pub fn set_strikeout(&mut self, strikeout: bool) {
        self.style.strikeout = strikeout;
        self.dirty = true;
    }

    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        self.style.anti_alias = anti_alias;
        self.dirty = true;
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.style.padding = padding;
        self.dirty = true;
    }

    pub fn set_left_padding(&mut self, px: u32) {
        self.style.padding.left = px;
        self.dirty = true;
    }

    pub fn set_top_padding(&mut self, px: u32) {
        self.style.padding.top = px;
        self.dirty = true;
    }

    pub fn set_width_padding(&mut self, px: u32) {
        self.style.padding.width = px;
        self.dirty = true;
    }

    pub fn set_height_padding(&mut self, px: u32) {
        self.style.padding.height = px;
        self.dirty = true;
    }

    pub fn set_base_color(&mut self, color: Rgba8) {
        self.style.base_color = color;
        self.dirty = true;
    }

    pub fn set_gradient_color(&mut self, color: Rgba8) {
        self.style.gradient_color = color;
        self.dirty = true;
    }

    pub fn set_gradient_angle(&mut self, degrees: f32) {
        self.style.gradient_angle = degrees;
        self.dirty = true;
    }

    /// Custom fill; `None` goes back to the base/gradient colors.
    pub fn set_paint(&mut self, paint: Option<Arc<dyn PaintSource>>) {
        self.style.paint = paint;
        self.dirty = true;
    }

    /// Outline width in pixels, clamped to `0..=4`.
    pub fn set_outline_width(&mut self, width: f32) {
        self.style.outline_width = clamp_outline_width(width);
        self.dirty = true;
    }

    pub fn set_outline_color(&mut self, color: Rgba8) {
        self.style.outline_color = color;
        self.dirty = true;
    }

    /// Replace the character set. The fallback character is always kept.
    pub fn set_characters(&mut self, chars: &str) {
        self.characters = CharacterSet::new(chars);
        self.dirty = true;
    }

    pub fn set_character_set(&mut self, characters: CharacterSet) {
        self.characters = characters;
        self.dirty = true;
    }

    /// Maximum page width, rounded up to a power of two if the device
    /// requires it.
    pub fn set_max_page_width(&mut self, width: u32) -> Result<(), AtlasError> {
        self.limits.max_width = PageLimits::validate_extent(&self.caps, Axis::Width, width)?;
        self.dirty = true;
        Ok(())
    }

    /// Maximum page height, rounded up to a power of two if the device
    /// requires it.
    pub fn set_max_page_height(&mut self, height: u32) -> Result<(), AtlasError> {
        self.limits.max_height = PageLimits::validate_extent(&self.caps, Axis::Height, height)?;
        self.dirty = true;
        Ok(())
    }

    /// Drop pages and glyphs, e.g. after the rendering device was lost.
    /// The next [`rebuild`](Self::rebuild) recreates them.
    pub fn release_resources(&mut self) {
        self.pages.clear();
        self.glyphs.clear();
        self.unresolved.clear();
        self.dirty = true;
    }

    // ── Building ────────────────────────────────────────────────────

    /// Rebuild if dirty. Returns whether a build ran.
    ///
    /// On error the previous pages and glyphs stay in place and the atlas
    /// stays dirty.
    pub fn rebuild(&mut self) -> Result<bool, AtlasError> {
        self.rebuild_with(&mut |_: &AtlasPage| {})
    }

    /// Like [`rebuild`](Self::rebuild), handing every page to `consumer`
    /// once the build succeeded.
    pub fn rebuild_with<C>(&mut self, consumer: &mut C) -> Result<bool, AtlasError>
    where
        C: PageConsumer + ?Sized,
    {
        if !self.dirty {
            return Ok(false);
        }

        let built = match self.build() {
            Ok(built) => built,
            Err(e) => {
                log::warn!("Rebuild of font '{}' failed: {e}", self.name);
                return Err(e);
            }
        };

        self.metrics = built.metrics;
        self.max_character_height = built.max_character_height;
        self.pages = built.pages;
        self.glyphs = built.glyphs;
        self.unresolved = built.unresolved;
        self.dirty = false;

        log::info!(
            "Built font '{}': {} pages, {} glyphs, {} unresolved",
            self.name,
            self.pages.len(),
            self.glyphs.len(),
            self.unresolved.len()
        );

        for page in &self.pages {
            consumer.consume(page);
        }
        Ok(true)
    }

    fn build(&mut self) -> Result<Built, AtlasError> {
        let style = &self.style;
        let source = &mut self.source;

        let metrics = source.font_metrics(style)?;
        let max_canvas = self.limits.size();
        let first_canvas = initial_canvas(&metrics, &style.padding, self.limits, &self.caps);

        let mut pages: Vec<AtlasPage> = Vec::new();
        let mut glyphs = FxHashMap::default();
        let mut unresolved = Vec::new();

        // Characters for heuristic-sized pages, then for full-size pages.
        let mut pending: Vec<char> = self.characters.as_slice().to_vec();
        let mut grown: Vec<char> = Vec::new();

        loop {
            let (canvas, work) = if !pending.is_empty() {
                (first_canvas, std::mem::take(&mut pending))
            } else if !grown.is_empty() {
                (max_canvas, std::mem::take(&mut grown))
            } else {
                break;
            };

            let pass = AtlasPageBuilder::new(pages.len(), canvas, style, metrics)
                .place_all(source, &work)?;

            for (ch, cell) in &pass.oversized {
                if canvas != max_canvas && max_canvas.contains(*cell) {
                    grown.push(*ch);
                } else if *ch == FALLBACK_CHAR {
                    return Err(AtlasError::GlyphTooLarge {
                        ch: *ch,
                        cell: *cell,
                        max: max_canvas,
                    });
                } else {
                    log::warn!(
                        "Glyph {ch:?} needs a {}x{} cell, larger than the {}x{} page limit",
                        cell.width,
                        cell.height,
                        max_canvas.width,
                        max_canvas.height
                    );
                    unresolved.push(*ch);
                }
            }

            if stalled(&work, &pass) {
                if pass.leftover.contains(&FALLBACK_CHAR) {
                    return Err(AtlasError::SizingStall {
                        remaining: pass.leftover,
                    });
                }
                log::warn!(
                    "Packing stalled on a {}x{} page, dropping {} characters",
                    canvas.width,
                    canvas.height,
                    pass.leftover.len()
                );
                unresolved.extend(pass.leftover);
                continue;
            }

            if canvas == first_canvas && canvas != max_canvas {
                pending.extend(pass.leftover);
            } else {
                grown.extend(pass.leftover);
            }

            if pass.placed.is_empty() {
                log::debug!("Pass on a {}x{} page placed nothing", canvas.width, canvas.height);
                continue;
            }
            for record in pass.placed {
                glyphs.insert(record.ch, record);
            }
            pages.push(pass.page);
        }

        for ch in &unresolved {
            log::debug!("Unresolved glyph {ch:?}");
        }

        let max_character_height = glyphs
            .values()
            .map(|g| g.size().height)
            .max()
            .filter(|&h| h > 0)
            .unwrap_or(metrics.line_height);

        Ok(Built {
            metrics,
            max_character_height,
            pages,
            glyphs,
            unresolved,
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
