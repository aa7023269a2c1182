//! Per-size glyph cache
//!
//! Glyphs are rasterized on first use and kept for the life of the cache.
//! Characters a face cannot render are remembered as empty glyphs so the
//! rasterizer is asked only once.

use crate::font::{FontId, FontMetrics};
use crate::rasterizer::{FaceHandle, GlyphRasterizer, RasterizedGlyph};
use crate::{Result, TextError};
use rustc_hash::FxHashMap;

/// A registered font as the cache sees it
#[derive(Debug, Clone)]
pub struct RegisteredFont {
    pub face: FaceHandle,
    pub metrics: FontMetrics,
    pub family_name: String,
}

/// All glyphs of one font at one pixel size
#[derive(Debug)]
pub struct GlyphSet {
    pixel_size: u32,
    ascent: f32,
    descent: f32,
    glyphs: FxHashMap<char, RasterizedGlyph>,
    empty: RasterizedGlyph,
}

impl GlyphSet {
    fn new(metrics: &FontMetrics, pixel_size: u32) -> Self {
        Self {
            pixel_size,
            ascent: metrics.ascender_px(pixel_size),
            descent: metrics.descender_px(pixel_size),
            glyphs: FxHashMap::default(),
            empty: RasterizedGlyph::empty(),
        }
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Baseline to top, pixels
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Baseline to bottom, pixels (negative)
    pub fn descent(&self) -> f32 {
        self.descent
    }

    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent
    }

    /// Cached glyph, or an empty one for characters never loaded
    pub fn glyph(&self, ch: char) -> &RasterizedGlyph {
        self.glyphs.get(&ch).unwrap_or(&self.empty)
    }

    pub fn advance(&self, ch: char) -> f32 {
        self.glyph(ch).advance
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Glyph sets keyed by font and pixel size
#[derive(Debug, Default)]
pub struct GlyphCache {
    sets: FxHashMap<(FontId, u32), GlyphSet>,
    rasterized: u64,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every character of `text` is loaded, then return the set
    pub fn ensure(
        &mut self,
        rasterizer: &mut dyn GlyphRasterizer,
        font_id: FontId,
        font: &RegisteredFont,
        pixel_size: u32,
        text: &str,
    ) -> Result<&GlyphSet> {
        let set = self
            .sets
            .entry((font_id, pixel_size))
            .or_insert_with(|| GlyphSet::new(&font.metrics, pixel_size));

        for ch in text.chars() {
            if ch == '\n' || set.glyphs.contains_key(&ch) {
                continue;
            }
            let glyph = match rasterizer.render_glyph(font.face, ch, pixel_size) {
                Ok(glyph) => glyph,
                Err(TextError::GlyphNotFound(missing)) => {
                    tracing::warn!(
                        "Font '{}' has no glyph for {:?}, drawing nothing",
                        font.family_name,
                        missing
                    );
                    RasterizedGlyph::empty()
                }
                Err(err) => return Err(err),
            };
            self.rasterized += 1;
            set.glyphs.insert(ch, glyph);
        }

        Ok(set)
    }

    pub fn get(&self, font_id: FontId, pixel_size: u32) -> Option<&GlyphSet> {
        self.sets.get(&(font_id, pixel_size))
    }

    /// Number of rasterizer calls made so far
    pub fn rasterized(&self) -> u64 {
        self.rasterized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRasterizer;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_missing_glyph_asked_once() {
        let mut rasterizer = MockRasterizer::new();
        let renders = rasterizer.counter();
        let font = rasterizer.register();
        let mut cache = GlyphCache::new();

        for _ in 0..3 {
            let set = cache
                .ensure(&mut rasterizer, FontId(0), &font, 16, "\u{2603}")
                .unwrap();
            assert_eq!(set.advance('\u{2603}'), 0.0);
        }
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sets_split_by_pixel_size() {
        let mut rasterizer = MockRasterizer::new();
        let font = rasterizer.register();
        let mut cache = GlyphCache::new();

        cache.ensure(&mut rasterizer, FontId(0), &font, 16, "ab\ncd").unwrap();
        cache.ensure(&mut rasterizer, FontId(0), &font, 32, "a").unwrap();

        let small = cache.get(FontId(0), 16).unwrap();
        assert_eq!(small.len(), 4);
        assert_eq!(small.line_height(), 16.0);
        assert_eq!(cache.get(FontId(0), 32).unwrap().advance('a'), 16.0);
        assert!(cache.get(FontId(1), 16).is_none());
    }
}
