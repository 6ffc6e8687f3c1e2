//! glyphpack: builds a glyph atlas for one font and logs what it packed.
//!
//! Uses `glyphpack-text` with the system fonts through `cosmic-text`, or
//! with box glyphs (`--synthetic`) on machines without fonts. Set
//! `RUST_LOG=debug` to see every page pass.

mod args;

use std::process;

use glyphpack_text::{
    AtlasError, AtlasPage, CosmicConfig, CosmicSource, DeviceCaps, FontAtlasManager,
    GlyphMetricsSource, StyleAttributes, SyntheticSource,
};
use clap::Parser;
use log::info;

use args::CliArgs;

fn build<S: GlyphMetricsSource>(source: S, args: &CliArgs) -> Result<(), AtlasError> {
    let style = StyleAttributes::new(args.family.as_str(), args.size);
    let mut font = FontAtlasManager::new(args.family.as_str(), source, style, DeviceCaps::default());
    if let Some(max_page) = args.max_page {
        font.set_max_page_width(max_page)?;
        font.set_max_page_height(max_page)?;
    }
    if let Some(chars) = &args.chars {
        font.set_characters(chars);
    }

    let mut uploaded = 0usize;
    font.rebuild_with(&mut |page: &AtlasPage| {
        uploaded += page.as_bytes().len();
        info!("Page {}: {}x{}", page.index(), page.size().width, page.size().height);
    })?;

    for page in font.pages() {
        let (count, used) = font
            .glyphs()
            .filter(|g| g.page == page.index())
            .fold((0usize, 0u64), |(n, area), g| (n + 1, area + g.cell.area()));
        let total = page.size().width as u64 * page.size().height as u64;
        info!(
            "Page {}: {} glyphs, {:.1}% of the page used",
            page.index(),
            count,
            used as f64 * 100.0 / total.max(1) as f64
        );
    }

    info!(
        "Font '{}' {}pt: line height {}, ascent {}, descent {}, tallest glyph {}",
        font.name(),
        font.style().font_size,
        font.line_height(),
        font.ascent(),
        font.descent(),
        font.max_character_height()
    );
    info!(
        "{} glyphs on {} pages ({} KiB of pixels)",
        font.glyph_count(),
        font.resource_count(),
        uploaded / 1024
    );
    if !font.unresolved().is_empty() {
        let unresolved: String = font.unresolved().iter().collect();
        log::warn!("Unresolved characters: {unresolved:?}");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();

    let result = if args.synthetic {
        build(SyntheticSource::new(), &args)
    } else {
        let source = CosmicSource::new(CosmicConfig::default());
        info!("Loaded {} font faces", source.face_count());
        build(source, &args)
    };

    if let Err(e) = result {
        log::error!("{e}");
        process::exit(1);
    }
}
