//! Deterministic glyph source that draws solid boxes.
//!
//! No fonts are involved: every glyph is `ceil(size * advance_ratio)`
//! pixels wide and `ceil(size)` tall unless overridden, so packing results
//! are reproducible on any machine. Used by tests, benchmarks and the CLI's
//! `--synthetic` mode.

use glyphpack_core::{Bitmap, Rect};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::paint::{composite_glyph, CoverageMask};
use crate::source::{FontMetrics, GlyphMetricsSource, GlyphSize, SourceError};
use crate::style::StyleAttributes;

/// Call counters, handy for asserting idempotence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub metrics_calls: usize,
    pub measure_calls: usize,
    pub render_calls: usize,
}

#[derive(Clone, Debug)]
pub struct SyntheticSource {
    advance_ratio: f32,
    overrides: FxHashMap<char, GlyphSize>,
    failing: FxHashSet<char>,
    stats: SourceStats,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            advance_ratio: 0.5,
            overrides: FxHashMap::default(),
            failing: FxHashSet::default(),
            stats: SourceStats::default(),
        }
    }

    /// Width of an un-overridden glyph as a fraction of the font size.
    pub fn with_advance_ratio(mut self, ratio: f32) -> Self {
        self.advance_ratio = ratio.max(0.0);
        self
    }

    /// Give `ch` a fixed natural size regardless of the font size.
    pub fn with_glyph(mut self, ch: char, width: u32, height: u32) -> Self {
        self.overrides.insert(ch, GlyphSize::new(width, height));
        self
    }

    /// Make measuring or rendering `ch` fail.
    pub fn failing_on(mut self, ch: char) -> Self {
        self.failing.insert(ch);
        self
    }

    /// Start failing on `ch` from now on.
    pub fn fail(&mut self, ch: char) {
        self.failing.insert(ch);
    }

    /// Stop failing on `ch`.
    pub fn recover(&mut self, ch: char) {
        self.failing.remove(&ch);
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    fn check(&self, ch: char) -> Result<(), SourceError> {
        if self.failing.contains(&ch) {
            return Err(SourceError::Glyph {
                ch,
                reason: String::from("synthetic failure"),
            });
        }
        Ok(())
    }
}

impl GlyphMetricsSource for SyntheticSource {
    fn font_metrics(&mut self, style: &StyleAttributes) -> Result<FontMetrics, SourceError> {
        self.stats.metrics_calls += 1;
        let line_height = ((style.font_size * 1.25).ceil() as u32).max(1);
        let ascent = (style.font_size.ceil() as u32).min(line_height);
        Ok(FontMetrics {
            line_height,
            ascent,
            descent: line_height - ascent,
        })
    }

    fn measure(&mut self, ch: char, style: &StyleAttributes) -> Result<GlyphSize, SourceError> {
        self.stats.measure_calls += 1;
        self.check(ch)?;
        if let Some(size) = self.overrides.get(&ch) {
            return Ok(*size);
        }
        Ok(GlyphSize::new(
            (style.font_size * self.advance_ratio).ceil() as u32,
            style.font_size.ceil() as u32,
        ))
    }

    fn render(
        &mut self,
        ch: char,
        style: &StyleAttributes,
        target: &mut Bitmap,
        cell: Rect,
        dest: Rect,
    ) -> Result<(), SourceError> {
        self.stats.render_calls += 1;
        self.check(ch)?;
        let mut mask = CoverageMask::solid(dest.width, dest.height);
        if style.underline && dest.height > 0 {
            mask.draw_hline(dest.height as i64 - 1, 1);
        }
        if style.strikeout {
            mask.draw_hline(dest.height as i64 / 2, 1);
        }
        composite_glyph(target, cell, dest, &mask, style);
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================
