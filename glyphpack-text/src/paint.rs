//! Glyph painting: fills, coverage masks and compositing into a page.
//!
//! Glyph sources produce an 8-bit [`CoverageMask`] per glyph; everything
//! after that (outline, fill style, decorations, clipping to the cell) is
//! shared here so every source draws identically.
//!
//! ```text
//!  CoverageMask ──dilate(outline_width)──▸ outline pass (outline_color)
//!       │
//!       └──────────────────────────────▸ fill pass (solid / gradient / custom)
//! ```

use std::fmt;

use glyphpack_core::{Bitmap, Rect, Rgba8};

use crate::style::StyleAttributes;

/// Caller-supplied paint for glyph fills.
///
/// `x`/`y` are page coordinates, `glyph` is the glyph's rect on the page.
pub trait PaintSource: Send + Sync + fmt::Debug {
    fn color_at(&self, x: u32, y: u32, glyph: Rect) -> Rgba8;
}

/// Resolved fill for one build. See [`StyleAttributes::fill`].
#[derive(Clone, Copy, Debug)]
pub enum Fill<'a> {
    Solid(Rgba8),
    /// Two-color linear gradient across the glyph rect.
    Gradient { from: Rgba8, to: Rgba8, angle: f32 },
    Custom(&'a dyn PaintSource),
}

impl Fill<'_> {
    /// Fill color at page pixel `(x, y)` for a glyph occupying `glyph`.
    pub fn color_at(&self, x: u32, y: u32, glyph: Rect) -> Rgba8 {
        match *self {
            Fill::Solid(color) => color,
            Fill::Custom(paint) => paint.color_at(x, y, glyph),
            Fill::Gradient { from, to, angle } => {
                let (sin, cos) = angle.to_radians().sin_cos();
                // Project the rect corners on the gradient axis to find its extent.
                let project = |px: f32, py: f32| px * cos + py * sin;
                let (x0, y0) = (glyph.x as f32, glyph.y as f32);
                let (x1, y1) = (glyph.right() as f32, glyph.bottom() as f32);
                let corners = [project(x0, y0), project(x1, y0), project(x0, y1), project(x1, y1)];
                let lo = corners.iter().copied().fold(f32::INFINITY, f32::min);
                let hi = corners.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let span = hi - lo;
                if span <= f32::EPSILON {
                    return from;
                }
                let t = (project(x as f32 + 0.5, y as f32 + 0.5) - lo) / span;
                from.lerp(to, t)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// CoverageMask
// ───────────────────────────────────────────────────────────────────

/// 8-bit coverage for one glyph, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CoverageMask {
    /// Empty (zero coverage) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Fully covered mask, the shape of a solid box glyph.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![255; width as usize * height as usize],
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Raise coverage at `(x, y)` to at least `value`. Out of range is ignored.
    #[inline]
    pub fn accumulate(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.data[i] = self.data[i].max(value);
    }

    /// Fully cover `thickness` rows starting at `y` (underline, strikeout).
    pub fn draw_hline(&mut self, y: i64, thickness: u32) {
        for row in y..y + thickness.max(1) as i64 {
            for x in 0..self.width as i64 {
                self.accumulate(x, row, 255);
            }
        }
    }

    /// Snap every pixel to 0 or 255 for aliased output.
    pub fn threshold(&mut self) {
        for v in &mut self.data {
            *v = if *v >= 128 { 255 } else { 0 };
        }
    }

    /// `true` when nothing is covered.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Grow the covered area by `radius` pixels in every direction.
    ///
    /// The result is `2 * ceil(radius)` larger on each axis; its origin sits
    /// `ceil(radius)` pixels up and left of this mask's origin.
    pub fn dilate(&self, radius: f32) -> CoverageMask {
        let r = radius.max(0.0).ceil() as i64;
        let r_sq = radius * radius;
        let mut out = CoverageMask::new(self.width + 2 * r as u32, self.height + 2 * r as u32);
        for oy in 0..out.height as i64 {
            for ox in 0..out.width as i64 {
                let (sx, sy) = (ox - r, oy - r);
                let mut best = 0u8;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if (dx * dx + dy * dy) as f32 > r_sq {
                            continue;
                        }
                        best = best.max(self.get(sx + dx, sy + dy));
                    }
                }
                out.data[oy as usize * out.width as usize + ox as usize] = best;
            }
        }
        out
    }
}

// ───────────────────────────────────────────────────────────────────
// Compositing
// ───────────────────────────────────────────────────────────────────

/// Draw `mask` into `target` with its origin at `dest`'s top-left corner.
///
/// When the style has an outline, the dilated mask is drawn first in the
/// outline color, then the fill on top. Nothing is drawn outside `clip`
/// (the glyph's padded cell), so neighbouring cells are never touched.
pub fn composite_glyph(
    target: &mut Bitmap,
    clip: Rect,
    dest: Rect,
    mask: &CoverageMask,
    style: &StyleAttributes,
) {
    let clip = clip_to_bitmap(clip, target);

    if style.has_outline() {
        let r = style.outline_width.ceil() as i64;
        let outline = mask.dilate(style.outline_width);
        blit(target, clip, dest.x as i64 - r, dest.y as i64 - r, &outline, |_, _| {
            style.outline_color
        });
    }

    let fill = style.fill();
    blit(target, clip, dest.x as i64, dest.y as i64, mask, |x, y| {
        fill.color_at(x, y, dest)
    });
}

fn clip_to_bitmap(clip: Rect, target: &Bitmap) -> Rect {
    let right = clip.right().min(target.width());
    let bottom = clip.bottom().min(target.height());
    let x = clip.x.min(right);
    let y = clip.y.min(bottom);
    Rect::new(x, y, right - x, bottom - y)
}

fn blit(
    target: &mut Bitmap,
    clip: Rect,
    origin_x: i64,
    origin_y: i64,
    mask: &CoverageMask,
    color: impl Fn(u32, u32) -> Rgba8,
) {
    for my in 0..mask.height() as i64 {
        let py = origin_y + my;
        if py < clip.y as i64 || py >= clip.bottom() as i64 {
            continue;
        }
        for mx in 0..mask.width() as i64 {
            let px = origin_x + mx;
            if px < clip.x as i64 || px >= clip.right() as i64 {
                continue;
            }
            let coverage = mask.get(mx, my);
            if coverage == 0 {
                continue;
            }
            let (px, py) = (px as u32, py as u32);
            target.blend(px, py, color(px, py).with_coverage(coverage));
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
