//! Caller-owned registry of named font atlases.

use rustc_hash::FxHashMap;

use crate::error::AtlasError;
use crate::manager::FontAtlasManager;
use crate::source::GlyphMetricsSource;

/// Named [`FontAtlasManager`]s, e.g. one per UI font.
pub struct FontCache<S> {
    fonts: FxHashMap<String, FontAtlasManager<S>>,
}

impl<S> Default for FontCache<S> {
    fn default() -> Self {
        Self {
            fonts: FxHashMap::default(),
        }
    }
}

impl<S: GlyphMetricsSource> FontCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `font` under its own name. Names must be unique.
    pub fn insert(&mut self, font: FontAtlasManager<S>) -> Result<&mut FontAtlasManager<S>, AtlasError> {
        let name = font.name().to_owned();
        if self.fonts.contains_key(&name) {
            return Err(AtlasError::DuplicateFont(name));
        }
        Ok(self.fonts.entry(name).or_insert(font))
    }

    pub fn get(&self, name: &str) -> Option<&FontAtlasManager<S>> {
        self.fonts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FontAtlasManager<S>> {
        self.fonts.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FontAtlasManager<S>> {
        self.fonts.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }

    /// Release every font's pages, e.g. after a device reset.
    pub fn release_resources(&mut self) {
        for font in self.fonts.values_mut() {
            font.release_resources();
        }
    }

    /// Rebuild every dirty font. Returns how many were rebuilt.
    ///
    /// Stops at the first failure; fonts already rebuilt keep their result.
    pub fn rebuild_all(&mut self) -> Result<usize, AtlasError> {
        let mut rebuilt = 0;
        for font in self.fonts.values_mut() {
            if font.rebuild()? {
                rebuilt += 1;
            }
        }
        Ok(rebuilt)
    }
}

// ===================================================================
// Tests
// ===================================================================
