//! Glyph rasterization
//!
//! [`GlyphRasterizer`] is the seam between the text cache and the font
//! engine. [`SwashRasterizer`] parses faces with ttf-parser and renders
//! glyph outlines with swash.

use crate::font::{FontFace, FontMetrics};
use crate::{Result, TextError};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Rasterizer-side handle of a loaded face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceHandle(pub u32);

/// Result of loading a face
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub handle: FaceHandle,
    pub metrics: FontMetrics,
    pub family_name: String,
}

/// Rasterized glyph bitmap with metrics
#[derive(Debug, Clone, Default)]
pub struct RasterizedGlyph {
    /// Coverage, 8-bit, row-major `width * height`
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Offset from pen position to the left edge of the bitmap
    pub bearing_x: i16,
    /// Offset from baseline to the top edge of the bitmap
    pub bearing_y: i16,
    /// Horizontal advance to the next pen position, in pixels
    pub advance: f32,
}

impl RasterizedGlyph {
    /// Zero-sized glyph that takes no space
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Font engine used by the text cache
pub trait GlyphRasterizer: Send {
    /// Parse a face from TTF/OTF bytes
    fn load_face(&mut self, data: Vec<u8>) -> Result<LoadedFace>;

    /// Render one character of a loaded face at `pixel_size`
    ///
    /// Returns [`TextError::GlyphNotFound`] when the face has no glyph for
    /// the character.
    fn render_glyph(&mut self, face: FaceHandle, ch: char, pixel_size: u32)
        -> Result<RasterizedGlyph>;
}

/// Glyph rasterizer using swash
pub struct SwashRasterizer {
    faces: Vec<FontFace>,
    /// Swash scale context (caches scaling state)
    scale_context: ScaleContext,
}

impl SwashRasterizer {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            scale_context: ScaleContext::new(),
        }
    }

    fn face(&self, handle: FaceHandle) -> Result<&FontFace> {
        self.faces
            .get(handle.0 as usize)
            .ok_or_else(|| TextError::RasterizationFailed(format!("unknown face {:?}", handle)))
    }
}

impl Default for SwashRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphRasterizer for SwashRasterizer {
    fn load_face(&mut self, data: Vec<u8>) -> Result<LoadedFace> {
        let face = FontFace::from_data(data)?;
        let loaded = LoadedFace {
            handle: FaceHandle(self.faces.len() as u32),
            metrics: *face.metrics(),
            family_name: face.family_name().to_string(),
        };
        self.faces.push(face);
        Ok(loaded)
    }

    fn render_glyph(
        &mut self,
        handle: FaceHandle,
        ch: char,
        pixel_size: u32,
    ) -> Result<RasterizedGlyph> {
        let index = handle.0 as usize;
        let face = self.face(handle)?;
        let glyph_id = face.glyph_id(ch).ok_or(TextError::GlyphNotFound(ch))?;

        let face = &self.faces[index];
        let swash_font = swash::FontRef::from_index(face.data(), face.face_index() as usize)
            .ok_or_else(|| TextError::InvalidFontData("swash rejected face".to_string()))?;

        let font_size = pixel_size as f32;
        let mut scaler = self
            .scale_context
            .builder(swash_font)
            .size(font_size)
            .build();

        let metrics = swash_font.metrics(&[]);
        let scale = font_size / metrics.units_per_em.max(1) as f32;
        let advance = swash_font.glyph_metrics(&[]).advance_width(glyph_id) * scale;

        let mut render = Render::new(&[
            Source::Outline,
            Source::Bitmap(StrikeWith::BestFit),
        ]);
        render.format(Format::Alpha);

        match render.render(&mut scaler, glyph_id) {
            Some(img) => {
                let width = img.placement.width;
                let height = img.placement.height;
                let pixels = (width * height) as usize;
                // Bitmap strikes may come back as RGBA; keep only coverage.
                let bitmap = if img.data.len() == pixels * 4 {
                    img.data.chunks_exact(4).map(|px| px[3]).collect()
                } else {
                    img.data
                };

                Ok(RasterizedGlyph {
                    bitmap,
                    width,
                    height,
                    bearing_x: img.placement.left as i16,
                    bearing_y: img.placement.top as i16,
                    advance,
                })
            }
            // Whitespace has no outline but still advances
            None => Ok(RasterizedGlyph {
                advance,
                ..RasterizedGlyph::empty()
            }),
        }
    }
}
