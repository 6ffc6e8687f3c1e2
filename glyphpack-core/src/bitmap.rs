//! CPU-side RGBA bitmaps backing the atlas pages.
//!
//! Pixels are stored as [`Rgba8`], which derives `bytemuck::Pod` so a
//! finished page can be handed to a texture uploader as a flat byte slice
//! without copying.

use bytemuck::{Pod, Zeroable};

use crate::geometry::{Rect, Size};

/// One straight-alpha RGBA pixel (4 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);

    #[inline(always)]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha scaled by `coverage` (0–255).
    #[inline]
    pub fn with_coverage(self, coverage: u8) -> Self {
        let a = (self.a as u32 * coverage as u32 + 127) / 255;
        Self { a: a as u8, ..self }
    }

    /// Linear interpolation between two colors, `t` in [0, 1].
    pub fn lerp(self, other: Rgba8, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Source-over composite of `src` onto `self` (straight alpha).
    pub fn over(self, src: Rgba8) -> Self {
        if src.a == 255 {
            return src;
        }
        if src.a == 0 {
            return self;
        }
        let sa = src.a as f32 / 255.0;
        let da = self.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Rgba8::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(src.r, self.r),
            g: channel(src.g, self.g),
            b: channel(src.b, self.b),
            a: (out_a * 255.0).round() as u8,
        }
    }
}

/// Row-major RGBA bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl Bitmap {
    /// Create a fully transparent bitmap.
    pub fn new(size: Size) -> Self {
        let count = size.width as usize * size.height as usize;
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![Rgba8::TRANSPARENT; count],
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

    #[inline(always)]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounds of the whole bitmap.
    #[inline(always)]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Raw RGBA bytes, `width * height * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the bitmap.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrite a pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Source-over blend a pixel. Out-of-bounds writes are ignored.
    pub fn blend(&mut self, x: u32, y: u32, color: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].over(color);
        }
    }

    /// Overwrite every pixel of `rect` (clipped to the bitmap).
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let right = rect.right().min(self.width);
        let bottom = rect.bottom().min(self.height);
        for y in rect.y..bottom {
            for x in rect.x..right {
                self.put(x, y, color);
            }
        }
    }

    /// `true` when every pixel inside `rect` is fully transparent.
    pub fn is_clear(&self, rect: Rect) -> bool {
        let right = rect.right().min(self.width);
        let bottom = rect.bottom().min(self.height);
        (rect.y..bottom).all(|y| {
            (rect.x..right).all(|x| self.get(x, y).is_some_and(|p| p.a == 0))
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
