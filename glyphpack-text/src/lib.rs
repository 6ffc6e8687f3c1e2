//! # glyphpack-text
//!
//! Glyph atlas builds: measures and rasterizes a character set and packs
//! the glyphs onto one or more fixed-size pages.
//!
//! ## Architecture
//!
//! ```text
//! FontAtlasManager (style, character set, dirty flag)
//!     │ rebuild()
//!     ▼
//! AtlasPageBuilder ──► RectanglePacker (glyphpack-core)
//!     │        ▲
//!     │        └── GlyphMetricsSource (CosmicSource / SyntheticSource)
//!     ▼
//! Vec<AtlasPage> + char ──► GlyphRecord table ──► PageConsumer (upload)
//! ```
//!
//! - **`manager`**: multi-page builds, glyph lookup, style setters.
//! - **`page`**: one page pass and the finished `AtlasPage`.
//! - **`source`**: the measuring/rendering contract.
//! - **`cosmic`**: `cosmic-text` backed source.
//! - **`synthetic`**: deterministic box-glyph source.
//! - **`paint`**: fills, outlines and compositing.
//! - **`style`**: style attributes, device caps, page limits, character sets.
//! - **`cache`**: named collection of managers.

pub mod cache;
pub mod cosmic;
pub mod error;
pub mod manager;
pub mod page;
pub mod paint;
pub mod source;
pub mod style;
pub mod synthetic;

// Re-exports for ergonomic use.
pub use cache::FontCache;
pub use cosmic::{CosmicConfig, CosmicSource};
pub use error::{AtlasError, Axis};
pub use manager::{FontAtlasManager, PageConsumer};
pub use page::{AtlasPage, AtlasPageBuilder, GlyphRecord, PagePass};
pub use paint::{composite_glyph, CoverageMask, Fill, PaintSource};
pub use source::{FontMetrics, GlyphMetricsSource, GlyphSize, SourceError};
pub use style::{
    CharacterSet, DeviceCaps, Padding, PageLimits, StyleAttributes, FALLBACK_CHAR,
    MAX_OUTLINE_WIDTH,
};
pub use synthetic::{SourceStats, SyntheticSource};
