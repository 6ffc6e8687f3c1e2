//! Pixel-space geometry shared by the packer and the atlas pages.
//!
//! Everything here is integral: glyph cells are whole pixels. The only
//! floating-point type is [`UvRect`], the texture-space view of a rect.

// ───────────────────────────────────────────────────────────────────
// Size
// ───────────────────────────────────────────────────────────────────

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline(always)]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `true` when `other` fits inside `self` on both axes.
    #[inline(always)]
    pub fn contains(&self, other: Size) -> bool {
        other.width <= self.width && other.height <= self.height
    }

    #[inline(always)]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

// ───────────────────────────────────────────────────────────────────
// Rect
// ───────────────────────────────────────────────────────────────────

/// Axis-aligned pixel rectangle stored as origin + size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline(always)]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rect at the origin covering `size`.
    #[inline(always)]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline(always)]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge.
    #[inline(always)]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline(always)]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    #[inline(always)]
    pub fn area(&self) -> u64 {
        self.size().area()
    }

    /// Overlap test. Rects that merely share an edge do not intersect.
    #[inline(always)]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// `true` when `other` lies fully inside `self`.
    #[inline(always)]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Point-in-rect test (half-open).
    #[inline(always)]
    pub fn contains_point(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Shrink from the top-left corner by `left`/`top`, keeping `size`.
    ///
    /// Used to find the glyph interior inside a padded cell.
    pub fn inset_origin(&self, left: u32, top: u32, size: Size) -> Rect {
        Rect::new(
            self.x.saturating_add(left),
            self.y.saturating_add(top),
            size.width,
            size.height,
        )
    }
}

// ───────────────────────────────────────────────────────────────────
// UvRect
// ───────────────────────────────────────────────────────────────────

/// A rect in normalized texture space, each coordinate in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UvRect {
    /// Top-left U coordinate.
    pub u_min: f32,
    /// Top-left V coordinate.
    pub v_min: f32,
    /// Bottom-right U coordinate.
    pub u_max: f32,
    /// Bottom-right V coordinate.
    pub v_max: f32,
}

impl UvRect {
    /// Half-pixel inset applied to every edge so bilinear sampling never
    /// reads the neighbouring cell.
    pub const TEXEL_INSET: f32 = 0.5;

    /// Normalize a pixel rect against the page it lives on.
    pub fn from_pixels(rect: &Rect, page: Size) -> Self {
        let inv_w = 1.0 / page.width.max(1) as f32;
        let inv_h = 1.0 / page.height.max(1) as f32;
        // A one-pixel cell collapses to its texel centre rather than inverting.
        let inset_x = Self::TEXEL_INSET.min(rect.width as f32 * 0.5);
        let inset_y = Self::TEXEL_INSET.min(rect.height as f32 * 0.5);
        Self {
            u_min: (rect.x as f32 + inset_x) * inv_w,
            v_min: (rect.y as f32 + inset_y) * inv_h,
            u_max: (rect.right() as f32 - inset_x) * inv_w,
            v_max: (rect.bottom() as f32 - inset_y) * inv_h,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.u_max - self.u_min
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.v_max - self.v_min
    }
}

// ===================================================================
// Tests
// ===================================================================
