//! Glyph source backed by `cosmic-text`.
//!
//! A `FontSystem` handles font discovery and shaping; a `SwashCache`
//! rasterizes the shaped glyphs. Each character is shaped on its own line,
//! its swash coverage copied into a [`CoverageMask`] laid out in line-box
//! coordinates, and the result cached so that `measure` followed by
//! `render` only rasterizes once.
//!
//! Point sizes are converted to pixels at [`CosmicConfig::dpi`].

use std::num::NonZeroUsize;

use cosmic_text::{
    Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style as CStyle, SwashCache,
    SwashContent, Weight,
};
use glyphpack_core::{Bitmap, Rect};
use lru::LruCache;

use crate::paint::{composite_glyph, CoverageMask};
use crate::source::{FontMetrics, GlyphMetricsSource, GlyphSize, SourceError};
use crate::style::StyleAttributes;

/// Line height as a multiple of the pixel size.
const LINE_SPACING: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosmicConfig {
    /// Dots per inch used to turn points into pixels.
    pub dpi: f32,
    /// Rasterized characters kept between `measure` and `render`.
    pub cache_capacity: usize,
}

impl Default for CosmicConfig {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            cache_capacity: 1024,
        }
    }
}

/// Everything that changes a character's rasterized shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MaskKey {
    ch: char,
    family: String,
    px_bits: u32,
    bold: bool,
    italic: bool,
}

/// One character shaped and rasterized in line-box coordinates.
#[derive(Clone, Debug)]
struct RasterizedGlyph {
    /// Pen advance in whole pixels, 0 for glyphs under a pixel wide.
    advance: u32,
    /// Baseline offset from the top of the line box.
    baseline: u32,
    /// Ink coverage; `None` for blank glyphs such as the space.
    ink: Option<(i64, i64, CoverageMask)>,
}

impl RasterizedGlyph {
    /// Height of the glyph box: the line height, extended downwards when the
    /// ink hangs below the line box.
    fn natural_height(&self, line_height: u32) -> u32 {
        let ink_bottom = self
            .ink
            .as_ref()
            .map_or(0, |(_, y, mask)| y.saturating_add(mask.height() as i64));
        u32::try_from(ink_bottom.max(0)).unwrap_or(u32::MAX).max(line_height)
    }
}

/// Converts a CSS-style family chain to a cosmic-text family.
///
/// Only the first entry is used; cosmic-text does its own fallback.
fn family_for(chain: &str) -> Family<'_> {
    let first = chain
        .split(',')
        .next()
        .unwrap_or(chain)
        .trim()
        .trim_matches('"')
        .trim_matches('\'');
    match first {
        "" | "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        concrete => Family::Name(concrete),
    }
}

/// Coverage of one swash pixel.
fn coverage_of(content: SwashContent, pixel: &[u8]) -> u8 {
    match content {
        SwashContent::Mask => pixel[0],
        SwashContent::Color => pixel[3],
        SwashContent::SubpixelMask => pixel[0].max(pixel[1]).max(pixel[2]),
    }
}

pub struct CosmicSource {
    font_system: FontSystem,
    swash_cache: SwashCache,
    config: CosmicConfig,
    masks: LruCache<MaskKey, RasterizedGlyph>,
}

impl CosmicSource {
    /// Source over the system fonts.
    pub fn new(config: CosmicConfig) -> Self {
        Self::with_font_system(FontSystem::new(), config)
    }

    /// Source over a caller-prepared font system (embedded fonts, tests).
    pub fn with_font_system(font_system: FontSystem, config: CosmicConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            config,
            masks: LruCache::new(capacity),
        }
    }

    pub fn config(&self) -> &CosmicConfig {
        &self.config
    }

    /// Number of font faces the font system knows about.
    pub fn face_count(&self) -> usize {
        self.font_system.db().faces().count()
    }

    /// Register a font from raw TTF/OTF bytes.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.font_system.db_mut().load_font_data(data);
        self.masks.clear();
    }

    /// Number of characters currently held in the raster cache.
    pub fn cached_glyphs(&self) -> usize {
        self.masks.len()
    }

    /// Font size in pixels.
    fn pixel_size(&self, style: &StyleAttributes) -> f32 {
        style.font_size * self.config.dpi / 72.0
    }

    fn line_height(px: f32) -> u32 {
        ((px * LINE_SPACING).ceil() as u32).max(1)
    }

    fn ensure_fonts(&self, style: &StyleAttributes) -> Result<(), SourceError> {
        if self.face_count() == 0 {
            return Err(SourceError::FontUnavailable(style.family.clone()));
        }
        Ok(())
    }

    /// Shape `text` on a single unbounded line.
    fn shape(&mut self, text: &str, style: &StyleAttributes, px: f32) -> Buffer {
        let metrics = Metrics::new(px, Self::line_height(px) as f32);
        let weight = if style.bold { Weight::BOLD } else { Weight::NORMAL };
        let font_style = if style.italic {
            CStyle::Italic
        } else {
            CStyle::Normal
        };
        let attrs = Attrs::new()
            .family(family_for(&style.family))
            .weight(weight)
            .style(font_style);

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    fn rasterize(&mut self, ch: char, style: &StyleAttributes, px: f32) -> RasterizedGlyph {
        let mut utf8 = [0u8; 4];
        let buffer = self.shape(ch.encode_utf8(&mut utf8), style, px);

        let mut advance = 0.0f32;
        let mut baseline = 0.0f32;
        // (x, y, width, height, coverage) per rasterized piece.
        let mut pieces: Vec<(i64, i64, u32, u32, Vec<u8>)> = Vec::new();

        for run in buffer.layout_runs() {
            baseline = run.line_y - run.line_top;
            for glyph in run.glyphs.iter() {
                advance += glyph.w;
                let physical = glyph.physical((0.0, 0.0), 1.0);
                let image = self
                    .swash_cache
                    .get_image(&mut self.font_system, physical.cache_key);
                let Some(image) = image.as_ref() else {
                    continue;
                };
                let (w, h) = (image.placement.width, image.placement.height);
                if w == 0 || h == 0 {
                    continue;
                }
                let bpp = match image.content {
                    SwashContent::Mask => 1,
                    SwashContent::Color | SwashContent::SubpixelMask => 4,
                };
                if image.data.len() < (w * h) as usize * bpp {
                    log::warn!("Short swash image for {ch:?}, skipping");
                    continue;
                }
                let coverage = image
                    .data
                    .chunks_exact(bpp)
                    .take((w * h) as usize)
                    .map(|p| coverage_of(image.content, p))
                    .collect();
                pieces.push((
                    physical.x as i64 + image.placement.left as i64,
                    (baseline.round() as i64) + physical.y as i64 - image.placement.top as i64,
                    w,
                    h,
                    coverage,
                ));
            }
        }

        let ink = if pieces.is_empty() {
            None
        } else {
            let min_x = pieces.iter().map(|p| p.0).min().unwrap_or(0);
            let min_y = pieces.iter().map(|p| p.1).min().unwrap_or(0);
            let max_x = pieces.iter().map(|p| p.0 + p.2 as i64).max().unwrap_or(0);
            let max_y = pieces.iter().map(|p| p.1 + p.3 as i64).max().unwrap_or(0);
            let mut mask = CoverageMask::new((max_x - min_x) as u32, (max_y - min_y) as u32);
            for (x, y, w, _, coverage) in &pieces {
                for (i, &value) in coverage.iter().enumerate() {
                    let (dx, dy) = ((i as u32 % w) as i64, (i as u32 / w) as i64);
                    mask.accumulate(x - min_x + dx, y - min_y + dy, value);
                }
            }
            Some((min_x, min_y, mask))
        };

        RasterizedGlyph {
            advance: if advance < 1.0 { 0 } else { advance.ceil() as u32 },
            baseline: baseline.max(0.0).round() as u32,
            ink,
        }
    }

    fn glyph(&mut self, ch: char, style: &StyleAttributes, px: f32) -> Result<&RasterizedGlyph, SourceError> {
        let key = MaskKey {
            ch,
            family: style.family.clone(),
            px_bits: px.to_bits(),
            bold: style.bold,
            italic: style.italic,
        };
        if !self.masks.contains(&key) {
            let glyph = self.rasterize(ch, style, px);
            self.masks.put(key.clone(), glyph);
        }
        self.masks.get(&key).ok_or_else(|| SourceError::Glyph {
            ch,
            reason: String::from("raster cache lost the glyph"),
        })
    }
}

impl GlyphMetricsSource for CosmicSource {
    fn font_metrics(&mut self, style: &StyleAttributes) -> Result<FontMetrics, SourceError> {
        self.ensure_fonts(style)?;
        let px = self.pixel_size(style);
        if px < 1.0 {
            return Ok(FontMetrics {
                line_height: 1,
                ascent: 1,
                descent: 0,
            });
        }

        let line_height = Self::line_height(px);
        let buffer = self.shape("M", style, px);
        let run = buffer
            .layout_runs()
            .next()
            .ok_or_else(|| SourceError::FontUnavailable(style.family.clone()))?;
        let ascent = ((run.line_y - run.line_top).ceil().max(0.0) as u32).min(line_height);
        Ok(FontMetrics {
            line_height,
            ascent,
            descent: line_height - ascent,
        })
    }

    fn measure(&mut self, ch: char, style: &StyleAttributes) -> Result<GlyphSize, SourceError> {
        self.ensure_fonts(style)?;
        let px = self.pixel_size(style);
        if px < 1.0 {
            return Ok(GlyphSize::new(0, 0));
        }
        let line_height = Self::line_height(px);
        let glyph = self.glyph(ch, style, px)?;
        Ok(GlyphSize::new(glyph.advance, glyph.natural_height(line_height)))
    }

    fn render(
        &mut self,
        ch: char,
        style: &StyleAttributes,
        target: &mut Bitmap,
        cell: Rect,
        dest: Rect,
    ) -> Result<(), SourceError> {
        self.ensure_fonts(style)?;
        let px = self.pixel_size(style);
        if px < 1.0 || dest.width == 0 || dest.height == 0 {
            return Ok(());
        }
        let glyph = self.glyph(ch, style, px)?;

        let mut mask = CoverageMask::new(dest.width, dest.height);
        if let Some((x, y, ink)) = &glyph.ink {
            for my in 0..ink.height() as i64 {
                for mx in 0..ink.width() as i64 {
                    mask.accumulate(x + mx, y + my, ink.get(mx, my));
                }
            }
        }

        let thickness = ((px / 14.0).round() as u32).max(1);
        let baseline = glyph.baseline as i64;
        if style.underline {
            let y = (baseline + 1).min(dest.height as i64 - thickness as i64);
            mask.draw_hline(y, thickness);
        }
        if style.strikeout {
            mask.draw_hline(baseline - (px * 0.3).round() as i64, thickness);
        }
        if !style.anti_alias {
            mask.threshold();
        }

        composite_glyph(target, cell, dest, &mask, style);
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glyphpack_core::Size;

    fn empty_font_system() -> FontSystem {
        FontSystem::new_with_locale_and_db(String::from("en-US"), cosmic_text::fontdb::Database::new())
    }

    /// System-font source, or `None` on machines without fonts.
    fn source() -> Option<CosmicSource> {
        let source = CosmicSource::new(CosmicConfig::default());
        if source.face_count() == 0 {
            eprintln!("no system fonts, skipping");
            return None;
        }
        Some(source)
    }

    #[test]
    fn test_family_for() {
        assert_eq!(family_for("sans-serif"), Family::SansSerif);
        assert_eq!(family_for("serif"), Family::Serif);
        assert_eq!(family_for("monospace"), Family::Monospace);
        assert_eq!(family_for("\"DejaVu Sans\", sans-serif"), Family::Name("DejaVu Sans"));
        assert_eq!(family_for(""), Family::SansSerif);
    }

    #[test]
    fn test_zero_capacity_cache_still_works() {
        let source = CosmicSource::with_font_system(
            empty_font_system(),
            CosmicConfig {
                dpi: 96.0,
                cache_capacity: 0,
            },
        );
        assert_eq!(source.cached_glyphs(), 0);
    }

    #[test]
    fn test_no_fonts_is_an_error() {
        let mut source = CosmicSource::with_font_system(
            empty_font_system(),
            CosmicConfig::default(),
        );
        let style = StyleAttributes::default();
        assert!(matches!(
            source.font_metrics(&style),
            Err(SourceError::FontUnavailable(_))
        ));
    }

    #[test]
    fn test_metrics() {
        let Some(mut source) = source() else { return };
        let style = StyleAttributes::new("sans-serif", 12.0);
        let metrics = source.font_metrics(&style).unwrap();
        // 12pt at 96 dpi is 16px.
        assert_eq!(metrics.line_height, 20);
        assert!(metrics.ascent > 0);
        assert_eq!(metrics.ascent + metrics.descent, metrics.line_height);
    }

    #[test]
    fn test_measure() {
        let Some(mut source) = source() else { return };
        let style = StyleAttributes::new("sans-serif", 12.0);
        let m = source.measure('M', &style).unwrap();
        let dot = source.measure('.', &style).unwrap();
        let space = source.measure(' ', &style).unwrap();
        assert!(m.width > dot.width);
        assert!(space.width >= 1);
        assert!(m.height >= 20);
        for ch in ['g', 'j', 'y', '\u{C5}'] {
            assert!(source.measure(ch, &style).unwrap().height >= 20);
        }

        let large = source.measure('M', &StyleAttributes::new("sans-serif", 24.0)).unwrap();
        assert!(large.width > m.width);
    }

    #[test]
    fn test_natural_height_follows_low_ink() {
        let blank = RasterizedGlyph {
            advance: 4,
            baseline: 15,
            ink: None,
        };
        assert_eq!(blank.natural_height(20), 20);

        let inside = RasterizedGlyph {
            ink: Some((0, 2, CoverageMask::new(8, 16))),
            ..blank.clone()
        };
        assert_eq!(inside.natural_height(20), 20);

        let hanging = RasterizedGlyph {
            ink: Some((0, 15, CoverageMask::new(8, 10))),
            ..blank.clone()
        };
        assert_eq!(hanging.natural_height(20), 25);

        let above = RasterizedGlyph {
            ink: Some((0, -6, CoverageMask::new(8, 4))),
            ..blank
        };
        assert_eq!(above.natural_height(20), 20);
    }

    #[test]
    fn test_measure_then_render_rasterizes_once() {
        let Some(mut source) = source() else { return };
        let style = StyleAttributes::new("sans-serif", 12.0);
        source.measure('A', &style).unwrap();
        source.measure('A', &style).unwrap();
        assert_eq!(source.cached_glyphs(), 1);

        let mut page = Bitmap::new(Size::new(32, 32));
        let size = source.measure('A', &style).unwrap();
        let cell = Rect::from_size(size);
        source.render('A', &style, &mut page, cell, cell).unwrap();
        assert_eq!(source.cached_glyphs(), 1);
    }

    #[test]
    fn test_render_stays_in_cell() {
        let Some(mut source) = source() else { return };
        let mut style = StyleAttributes::new("sans-serif", 12.0);
        style.italic = true;
        style.outline_width = 2.0;
        let size = source.measure('W', &style).unwrap();

        let mut page = Bitmap::new(Size::new(64, 64));
        let cell = Rect::new(10, 10, size.width + 4, size.height + 4);
        let dest = cell.inset_origin(2, 2, size);
        source.render('W', &style, &mut page, cell, dest).unwrap();

        assert!(!page.is_clear(cell));
        assert!(page.is_clear(Rect::new(0, 0, 64, 10)));
        assert!(page.is_clear(Rect::new(0, 0, 10, 64)));
        assert!(page.is_clear(Rect::new(cell.right(), 0, 64 - cell.right(), 64)));
        assert!(page.is_clear(Rect::new(0, cell.bottom(), 64, 64 - cell.bottom())));
    }

    #[test]
    fn test_aliased_render_is_binary() {
        let Some(mut source) = source() else { return };
        let mut style = StyleAttributes::new("sans-serif", 12.0);
        style.anti_alias = false;
        let size = source.measure('g', &style).unwrap();
        let mut page = Bitmap::new(size);
        let cell = Rect::from_size(size);
        source.render('g', &style, &mut page, cell, cell).unwrap();
        assert!(page.pixels().iter().all(|p| p.a == 0 || p.a == 255));
    }

    #[test]
    fn test_underline_touches_bottom_rows() {
        let Some(mut source) = source() else { return };
        let mut style = StyleAttributes::new("sans-serif", 12.0);
        style.underline = true;
        let size = source.measure(' ', &style).unwrap();
        let mut page = Bitmap::new(size);
        let cell = Rect::from_size(size);
        source.render(' ', &style, &mut page, cell, cell).unwrap();
        // A space has no ink, so anything drawn is the underline.
        assert!(!page.is_clear(cell));
    }

    #[test]
    fn test_zero_size_font() {
        let Some(mut source) = source() else { return };
        let style = StyleAttributes::new("sans-serif", 0.0);
        assert_eq!(source.font_metrics(&style).unwrap().line_height, 1);
        assert_eq!(source.measure('A', &style).unwrap(), GlyphSize::new(0, 0));
    }
}
