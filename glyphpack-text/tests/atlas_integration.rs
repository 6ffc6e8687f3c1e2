//! End-to-end atlas builds driven through `FontAtlasManager` with the
//! deterministic synthetic source.
//!
//! At 10pt the synthetic source measures plain glyphs as 5x10 on a 13px
//! line, so every unpadded cell is 5x13.

use std::sync::Arc;

use glyphpack_core::{Rect, Rgba8, Size};
use glyphpack_text::{
    AtlasError, AtlasPage, DeviceCaps, FontAtlasManager, GlyphRecord, Padding, PaintSource,
    StyleAttributes, SyntheticSource,
};

fn font(source: SyntheticSource) -> FontAtlasManager<SyntheticSource> {
    FontAtlasManager::new(
        "test",
        source,
        StyleAttributes::new("any", 10.0),
        DeviceCaps::default(),
    )
}

fn font_with_page(source: SyntheticSource, width: u32, height: u32) -> FontAtlasManager<SyntheticSource> {
    let mut font = font(source);
    font.set_max_page_width(width).unwrap();
    font.set_max_page_height(height).unwrap();
    font
}

fn sorted_glyphs(font: &FontAtlasManager<SyntheticSource>) -> Vec<GlyphRecord> {
    let mut glyphs: Vec<GlyphRecord> = font.glyphs().copied().collect();
    glyphs.sort_by_key(|g| g.ch);
    glyphs
}

/// Every glyph lies inside its page and no two cells on a page overlap.
fn assert_well_packed(font: &FontAtlasManager<SyntheticSource>) {
    let glyphs = sorted_glyphs(font);
    for (i, a) in glyphs.iter().enumerate() {
        let page = font.page(a.page).expect("glyph points at a missing page");
        assert!(Rect::from_size(page.size()).contains_rect(&a.cell), "{a:?} leaves its page");
        assert!(a.cell.contains_rect(&a.glyph));
        for b in &glyphs[i + 1..] {
            if a.page == b.page {
                assert!(!a.cell.intersects(&b.cell), "{a:?} overlaps {b:?}");
            }
        }
    }
}

/// Nothing is drawn outside the packed cells.
fn assert_ink_inside_cells(font: &FontAtlasManager<SyntheticSource>) {
    let glyphs = sorted_glyphs(font);
    for page in font.pages() {
        let cells: Vec<Rect> = glyphs
            .iter()
            .filter(|g| g.page == page.index())
            .map(|g| g.cell)
            .collect();
        let bitmap = page.bitmap();
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                if bitmap.get(x, y) != Some(Rgba8::TRANSPARENT) {
                    assert!(
                        cells.iter().any(|c| c.contains_point(x, y)),
                        "stray pixel at ({x}, {y}) on page {}",
                        page.index()
                    );
                }
            }
        }
    }
}

#[test]
fn test_two_characters_on_one_page() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.set_characters("A ");
    assert!(font.rebuild().unwrap());

    assert_eq!(font.resource_count(), 1);
    assert_eq!(font.page(0).unwrap().size(), Size::new(64, 64));
    let a = *font.get_glyph('A').unwrap();
    let space = *font.get_glyph(' ').unwrap();
    assert_eq!(a.ch, 'A');
    assert_eq!(space.ch, ' ');
    assert_eq!(a.cell, Rect::new(0, 0, 5, 13));
    assert_eq!(space.cell, Rect::new(0, 13, 5, 13));
    assert!(!a.cell.intersects(&space.cell));
    assert_well_packed(&font);
}

#[test]
fn test_overflow_spills_onto_more_pages() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.rebuild().unwrap();

    assert_eq!(font.resource_count(), 2);
    assert_eq!(font.glyph_count(), 96);
    assert!(font.unresolved().is_empty());
    for ch in font.characters().iter() {
        assert!(font.contains(ch), "{ch:?} missing");
    }
    assert_well_packed(&font);
    assert_ink_inside_cells(&font);
}

#[test]
fn test_padding_costs_pages() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.set_padding(Padding::uniform(1));
    font.rebuild().unwrap();

    assert_eq!(font.resource_count(), 3);
    assert_eq!(font.glyph_count(), 96);
    for glyph in font.glyphs() {
        assert_eq!(glyph.cell.size(), Size::new(7, 15));
        assert_eq!(glyph.glyph.x, glyph.cell.x + 1);
        assert_eq!(glyph.glyph.y, glyph.cell.y + 1);
    }
    assert_well_packed(&font);
    assert_ink_inside_cells(&font);
}

#[test]
fn test_oversized_glyph_is_unresolved() {
    let source = SyntheticSource::new().with_glyph('X', 128, 128);
    let mut font = font_with_page(source, 64, 64);
    font.set_characters("AX");
    assert!(font.rebuild().unwrap());

    assert_eq!(font.unresolved(), ['X']);
    assert!(!font.contains('X'));
    assert_eq!(font.glyph_count(), 2);
    assert_eq!(font.resource_count(), 1);
    // Lookups fall back to the space.
    assert_eq!(font.get_glyph('X').unwrap().ch, ' ');
}

#[test]
fn test_oversized_fallback_fails_the_build() {
    let source = SyntheticSource::new().with_glyph(' ', 100, 5);
    let mut font = font_with_page(source, 64, 64);
    font.set_characters("A");

    let err = font.rebuild().unwrap_err();
    assert!(matches!(
        err,
        AtlasError::GlyphTooLarge { ch: ' ', cell, max }
            if cell == Size::new(100, 13) && max == Size::new(64, 64)
    ));
    assert!(font.is_dirty());
    assert_eq!(font.resource_count(), 0);
}

#[test]
fn test_huge_padding_makes_fallback_too_large() {
    let mut font = font(SyntheticSource::new());
    font.set_characters("A");
    font.set_left_padding(u32::MAX);
    font.set_width_padding(1);

    let err = font.rebuild().unwrap_err();
    assert!(matches!(
        err,
        AtlasError::GlyphTooLarge { ch: ' ', cell, max }
            if cell == Size::new(u32::MAX, 13) && max == Size::new(512, 512)
    ));
    assert!(font.is_dirty());
    assert_eq!(font.resource_count(), 0);
}

#[test]
fn test_font_size_change_rebuilds_rects() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.set_characters("AB");
    font.rebuild().unwrap();
    let before = *font.get_glyph('A').unwrap();
    assert_eq!(before.cell, Rect::new(0, 13, 5, 13));

    font.set_font_size(20.0);
    assert!(font.is_dirty());
    // Queries keep answering from the last build until the rebuild.
    assert_eq!(*font.get_glyph('A').unwrap(), before);

    font.rebuild().unwrap();
    let after = *font.get_glyph('A').unwrap();
    assert_eq!(after.cell, Rect::new(0, 25, 10, 25));
    assert_eq!(after.size(), Size::new(10, 20));
    assert_eq!(font.line_height(), 25);
}

#[test]
fn test_rebuild_is_idempotent() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    assert!(font.rebuild().unwrap());
    let glyphs = sorted_glyphs(&font);
    let pages: Vec<AtlasPage> = font.pages().to_vec();
    let stats = font.source().stats();

    assert!(!font.rebuild().unwrap());
    assert!(!font.is_dirty());
    assert_eq!(sorted_glyphs(&font), glyphs);
    assert_eq!(font.pages(), pages.as_slice());
    assert_eq!(font.source().stats(), stats);
}

#[test]
fn test_rebuilding_a_dirty_atlas_is_deterministic() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.rebuild().unwrap();
    let glyphs = sorted_glyphs(&font);
    let pages: Vec<AtlasPage> = font.pages().to_vec();

    font.set_bold(false);
    assert!(font.rebuild().unwrap());
    assert_eq!(sorted_glyphs(&font), glyphs);
    assert_eq!(font.pages(), pages.as_slice());
}

#[test]
fn test_uv_round_trip() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 128);
    font.set_padding(Padding::uniform(2));
    font.rebuild().unwrap();

    for glyph in font.glyphs() {
        let page = font.page(glyph.page).unwrap().size();
        let (w, h) = (page.width as f32, page.height as f32);
        let cell = glyph.cell;
        assert!((glyph.uv.u_min * w - cell.x as f32).abs() <= 0.5 + 1e-3);
        assert!((glyph.uv.v_min * h - cell.y as f32).abs() <= 0.5 + 1e-3);
        assert!((glyph.uv.width() * w - cell.width as f32).abs() <= 1.0 + 1e-3);
        assert!((glyph.uv.height() * h - cell.height as f32).abs() <= 1.0 + 1e-3);
        assert!(glyph.uv.u_min < glyph.uv.u_max);
        assert!(glyph.uv.v_min < glyph.uv.v_max);
    }
}

#[test]
fn test_measurement_failure_keeps_previous_build() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.set_characters("AB");
    font.rebuild().unwrap();
    let before = sorted_glyphs(&font);

    font.source_mut().fail('B');
    font.set_font_size(20.0);
    assert!(matches!(font.rebuild(), Err(AtlasError::Measurement(_))));
    assert!(font.is_dirty());
    assert_eq!(sorted_glyphs(&font), before);
    assert_eq!(font.resource_count(), 1);
    assert_eq!(font.line_height(), 13);

    font.source_mut().recover('B');
    assert!(font.rebuild().unwrap());
    assert_eq!(font.line_height(), 25);
}

#[test]
fn test_power_of_two_device() {
    let caps = DeviceCaps {
        requires_power_of_two: true,
        ..DeviceCaps::default()
    };
    let mut font = FontAtlasManager::new(
        "pow2",
        SyntheticSource::new(),
        StyleAttributes::new("any", 10.0),
        caps,
    );
    font.set_max_page_width(100).unwrap();
    assert_eq!(font.limits().max_width, 128);
    font.rebuild().unwrap();

    for page in font.pages() {
        assert!(page.size().width.is_power_of_two());
        assert!(page.size().height.is_power_of_two());
    }
    assert_eq!(font.page(0).unwrap().size(), Size::new(128, 256));
    assert_well_packed(&font);
}

#[test]
fn test_zero_width_glyph_gets_a_slot() {
    let source = SyntheticSource::new().with_glyph('\u{200B}', 0, 10);
    let mut font = font(source);
    font.set_characters("\u{200B}A");
    font.rebuild().unwrap();

    let zw = font.get_glyph('\u{200B}').unwrap();
    assert_eq!(zw.ch, '\u{200B}');
    assert!(!zw.is_visible());
    assert_eq!(zw.advance(), 0);
    assert_eq!(zw.cell.width, 5);
    assert!(font.page(0).unwrap().bitmap().is_clear(zw.cell));
    assert_well_packed(&font);
}

#[test]
fn test_glyph_pixels() {
    let mut font = font(SyntheticSource::new());
    font.set_characters("A");
    font.set_padding(Padding::uniform(1));
    font.rebuild().unwrap();

    let a = *font.get_glyph('A').unwrap();
    let bitmap = font.page(a.page).unwrap().bitmap();
    assert_eq!(bitmap.get(a.glyph.x, a.glyph.y), Some(Rgba8::WHITE));
    assert_eq!(bitmap.get(a.glyph.right() - 1, a.glyph.bottom() - 1), Some(Rgba8::WHITE));
    assert_eq!(bitmap.get(a.cell.x, a.cell.y), Some(Rgba8::TRANSPARENT));
}

#[test]
fn test_outline_stays_in_cell() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    font.set_padding(Padding::uniform(1));
    font.set_outline_width(3.0);
    font.rebuild().unwrap();

    let a = *font.get_glyph('A').unwrap();
    let bitmap = font.page(a.page).unwrap().bitmap();
    // Outline shows in the padding, the fill on top of it.
    assert_eq!(bitmap.get(a.cell.x, a.glyph.y + 2), Some(Rgba8::BLACK));
    assert_eq!(bitmap.get(a.glyph.x, a.glyph.y), Some(Rgba8::WHITE));
    assert_ink_inside_cells(&font);
}

#[test]
fn test_gradient_fill() {
    let red = Rgba8::new(255, 0, 0, 255);
    let blue = Rgba8::new(0, 0, 255, 255);
    let source = SyntheticSource::new().with_glyph('M', 20, 10);
    let mut font = font(source);
    font.set_characters("M");
    font.set_base_color(red);
    font.set_gradient_color(blue);
    font.set_gradient_angle(0.0);
    font.rebuild().unwrap();

    let m = *font.get_glyph('M').unwrap();
    let bitmap = font.page(m.page).unwrap().bitmap();
    let left = bitmap.get(m.glyph.x, m.glyph.y).unwrap();
    let right = bitmap.get(m.glyph.right() - 1, m.glyph.y).unwrap();
    assert!(left.r > left.b);
    assert!(right.b > right.r);
}

#[derive(Debug)]
struct Stripes;

impl PaintSource for Stripes {
    fn color_at(&self, x: u32, _y: u32, _glyph: Rect) -> Rgba8 {
        if x % 2 == 0 {
            Rgba8::new(0, 255, 0, 255)
        } else {
            Rgba8::new(0, 0, 0, 255)
        }
    }
}

#[test]
fn test_custom_paint() {
    let mut font = font(SyntheticSource::new());
    font.set_characters("A");
    font.set_paint(Some(Arc::new(Stripes)));
    font.rebuild().unwrap();

    let a = *font.get_glyph('A').unwrap();
    let bitmap = font.page(a.page).unwrap().bitmap();
    for x in a.glyph.x..a.glyph.right() {
        let expected = if x % 2 == 0 { 255 } else { 0 };
        assert_eq!(bitmap.get(x, a.glyph.y).unwrap().g, expected);
    }
}

#[test]
fn test_character_set_keeps_fallback() {
    let mut font = font(SyntheticSource::new());
    font.set_characters("AAB");
    font.rebuild().unwrap();
    assert_eq!(font.glyph_count(), 3);
    assert!(font.contains(' '));

    font.set_characters("");
    font.rebuild().unwrap();
    assert_eq!(font.glyph_count(), 1);
    assert_eq!(font.get_glyph('Q').unwrap().ch, ' ');
}

#[test]
fn test_pages_handed_to_consumer_in_order() {
    let mut font = font_with_page(SyntheticSource::new(), 64, 64);
    let mut uploads: Vec<(usize, Size, usize)> = Vec::new();
    font.rebuild_with(&mut |page: &AtlasPage| {
        uploads.push((page.index(), page.size(), page.as_bytes().len()))
    })
    .unwrap();

    assert_eq!(
        uploads,
        vec![
            (0, Size::new(64, 64), 64 * 64 * 4),
            (1, Size::new(64, 64), 64 * 64 * 4)
        ]
    );

    // A clean atlas hands nothing over.
    uploads.clear();
    assert!(!font
        .rebuild_with(&mut |page: &AtlasPage| uploads.push((page.index(), page.size(), 0)))
        .unwrap());
    assert!(uploads.is_empty());
}
