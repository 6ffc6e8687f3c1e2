//! # glyphpack-core
//!
//! Geometry, pixel storage and rectangle packing for glyph atlases.
//!
//! ## Crate modules
//!
//! - [`geometry`]: pixel `Size`/`Rect` and normalized `UvRect`
//! - [`bitmap`]: `Rgba8` pixels and the `Bitmap` backing a page
//! - [`packer`]: BSP-tree `RectanglePacker` for one fixed-size page

pub mod bitmap;
pub mod geometry;
pub mod packer;

// Re-exports for convenience
pub use bitmap::{Bitmap, Rgba8};
pub use geometry::{Rect, Size, UvRect};
pub use packer::{PackError, RectanglePacker};
