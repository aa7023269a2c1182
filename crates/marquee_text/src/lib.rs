//! Marquee Text
//!
//! Text rendering for the overlay:
//!
//! - Font parsing (ttf-parser) and glyph rasterization (swash)
//! - Per-size glyph caching
//! - Greedy line breaking and measurement
//! - Shadow and outline composition
//! - A texture cache with idle-timeout garbage collection

pub mod cache;
pub mod compose;
pub mod font;
pub mod glyphs;
pub mod layout;
pub mod rasterizer;

pub use cache::{SharedTextCache, TextCache, TextCacheStats, TextTexture};
pub use compose::{Padding, TextBitmap, TextEffect, TextStyle};
pub use font::{FontFace, FontId, FontMetrics};
pub use layout::{break_lines, TextLayout};
pub use rasterizer::{FaceHandle, GlyphRasterizer, LoadedFace, RasterizedGlyph, SwashRasterizer};

use thiserror::Error;

/// Text rendering errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextError {
    #[error("invalid font data: {0}")]
    InvalidFontData(String),

    #[error("invalid font id {0:?}")]
    InvalidFontId(FontId),

    #[error("glyph not found for character '{0}'")]
    GlyphNotFound(char),

    #[error("text rasterization failed: {0}")]
    RasterizationFailed(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
