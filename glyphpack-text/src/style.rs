//! Font style attributes, page limits and the requested character set.
//!
//! These are plain configuration structs with `Default` impls. The
//! [`FontAtlasManager`](crate::manager::FontAtlasManager) owns one of each
//! and marks itself dirty whenever a setter touches them.

use std::sync::Arc;

use glyphpack_core::{Rgba8, Size};
use rustc_hash::FxHashSet;

use crate::error::{AtlasError, Axis};
use crate::paint::{Fill, PaintSource};

/// Character every atlas must contain. Lookups for missing characters
/// resolve to it.
pub const FALLBACK_CHAR: char = ' ';

/// Upper bound for the outline pen width, in pixels.
pub const MAX_OUTLINE_WIDTH: f32 = 4.0;

// ── Padding ─────────────────────────────────────────────────────────

/// Extra pixels reserved around each glyph inside its cell.
///
/// `left`/`top` offset the glyph inside the cell; `width`/`height` are
/// added after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Padding {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Padding {
    pub const fn uniform(px: u32) -> Self {
        Self {
            left: px,
            top: px,
            width: px,
            height: px,
        }
    }

    /// Total horizontal padding, saturating at `u32::MAX`.
    #[inline(always)]
    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    /// Total vertical padding, saturating at `u32::MAX`.
    #[inline(always)]
    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

// ── Style attributes ────────────────────────────────────────────────

/// Everything that affects how glyphs are measured and drawn.
#[derive(Clone, Debug)]
pub struct StyleAttributes {
    /// Family name or CSS-style chain (`"DejaVu Sans, sans-serif"`).
    pub family: String,
    /// Size in points. Never negative.
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub anti_alias: bool,
    pub padding: Padding,
    /// Fill color, or the gradient start color.
    pub base_color: Rgba8,
    /// Gradient end color. Equal to `base_color` for a solid fill.
    pub gradient_color: Rgba8,
    /// Gradient direction in degrees, clockwise from +x.
    pub gradient_angle: f32,
    /// Caller-supplied paint. Overrides both colors when set.
    pub paint: Option<Arc<dyn PaintSource>>,
    /// Outline pen width in pixels, 0 to [`MAX_OUTLINE_WIDTH`].
    pub outline_width: f32,
    pub outline_color: Rgba8,
}

impl Default for StyleAttributes {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            font_size: 9.0,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            anti_alias: true,
            padding: Padding::default(),
            base_color: Rgba8::WHITE,
            gradient_color: Rgba8::WHITE,
            gradient_angle: 0.0,
            paint: None,
            outline_width: 0.0,
            outline_color: Rgba8::BLACK,
        }
    }
}

impl StyleAttributes {
    /// Style for `family` at `font_size` points, everything else default.
    pub fn new(family: impl Into<String>, font_size: f32) -> Self {
        Self {
            family: family.into(),
            font_size,
            ..Default::default()
        }
        .sanitized()
    }

    /// Clamp numeric fields into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.font_size = clamp_font_size(self.font_size);
        self.outline_width = clamp_outline_width(self.outline_width);
        self
    }

    /// `true` when an outline pass should be drawn before the fill.
    pub fn has_outline(&self) -> bool {
        self.outline_width > 0.0 && self.outline_color.a > 0
    }

    /// Resolve the fill: custom paint, then gradient, then solid.
    pub fn fill(&self) -> Fill<'_> {
        if let Some(paint) = &self.paint {
            Fill::Custom(paint.as_ref())
        } else if self.base_color != self.gradient_color {
            Fill::Gradient {
                from: self.base_color,
                to: self.gradient_color,
                angle: self.gradient_angle,
            }
        } else {
            Fill::Solid(self.base_color)
        }
    }
}

pub(crate) fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(0.0)
    } else {
        0.0
    }
}

pub(crate) fn clamp_outline_width(width: f32) -> f32 {
    if width.is_finite() {
        width.clamp(0.0, MAX_OUTLINE_WIDTH)
    } else {
        0.0
    }
}

// ── Device capabilities ─────────────────────────────────────────────

/// Texture limits of whatever will consume the pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceCaps {
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    /// Page dimensions must be powers of two.
    pub requires_power_of_two: bool,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            max_texture_width: 4096,
            max_texture_height: 4096,
            requires_power_of_two: false,
        }
    }
}

impl DeviceCaps {
    /// Largest page this device accepts.
    pub fn max_texture(&self) -> Size {
        Size::new(self.max_texture_width.max(1), self.max_texture_height.max(1))
    }

    /// Round `value` up to a power of two if the device needs it.
    #[inline]
    pub fn round_extent(&self, value: u32) -> u32 {
        if self.requires_power_of_two {
            value.checked_next_power_of_two().unwrap_or(u32::MAX)
        } else {
            value
        }
    }
}

// ── Page limits ─────────────────────────────────────────────────────

/// Maximum size of one atlas page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_width: 512,
            max_height: 512,
        }
    }
}

impl PageLimits {
    #[inline(always)]
    pub fn size(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }

    /// Validate one page dimension against `caps`: rounded up to a power of
    /// two when required, and rejected outside `1..=max_texture`.
    pub fn validate_extent(caps: &DeviceCaps, axis: Axis, value: u32) -> Result<u32, AtlasError> {
        let max = match axis {
            Axis::Width => caps.max_texture_width,
            Axis::Height => caps.max_texture_height,
        };
        let rounded = if value == 0 { 0 } else { caps.round_extent(value) };
        if rounded == 0 || rounded > max {
            return Err(AtlasError::InvalidPageSize { axis, value, max });
        }
        Ok(rounded)
    }

    /// Clamp into what `caps` accepts without failing. Used for defaults.
    pub fn fit_to(self, caps: &DeviceCaps) -> Self {
        let fit = |value: u32, max: u32| {
            let mut v = caps.round_extent(value.max(1));
            if v > max {
                v = max;
                if caps.requires_power_of_two && !v.is_power_of_two() {
                    // Largest power of two not above the device limit.
                    v = 1 << (31 - v.leading_zeros());
                }
            }
            v.max(1)
        };
        Self {
            max_width: fit(self.max_width, caps.max_texture_width.max(1)),
            max_height: fit(self.max_height, caps.max_texture_height.max(1)),
        }
    }
}

// ── Character set ───────────────────────────────────────────────────

/// Ordered, de-duplicated list of characters to pack.
///
/// Always contains [`FALLBACK_CHAR`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
}

impl Default for CharacterSet {
    /// Printable ASCII plus DEL, `0x20..0x80`.
    fn default() -> Self {
        Self::from_chars((0x20u8..0x80).map(char::from))
    }
}

impl CharacterSet {
    /// Build from a string. An empty string yields just the fallback.
    pub fn new(chars: &str) -> Self {
        Self::from_chars(chars.chars())
    }

    /// Build from any char iterator, keeping first occurrences in order and
    /// prepending the fallback when it is missing.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let mut seen = FxHashSet::default();
        let mut out: Vec<char> = chars.into_iter().filter(|&ch| seen.insert(ch)).collect();
        if !seen.contains(&FALLBACK_CHAR) {
            out.insert(0, FALLBACK_CHAR);
        }
        Self { chars: out }
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Never true; the fallback is always present.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

// ===================================================================
// Tests
// ===================================================================
