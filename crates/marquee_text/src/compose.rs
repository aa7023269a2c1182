//! CPU composition of laid-out text into an RGBA bitmap

use crate::glyphs::GlyphSet;
use crate::layout::TextLayout;
use crate::{Result, TextError};
use marquee_core::Color;

/// Largest width or height of a composed bitmap, pixels
pub const MAX_BITMAP_SIDE: u32 = 8192;

/// Decoration drawn behind the glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEffect {
    #[default]
    None,
    /// Copy of the text offset down and right
    Shadow { offset: u32 },
    /// Text dilated in the eight compass directions
    Outline { radius: u32 },
}

/// Extra pixels an effect needs around the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Padding {
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

impl TextEffect {
    pub fn padding(&self) -> Padding {
        match *self {
            TextEffect::None => Padding::default(),
            TextEffect::Shadow { offset } => Padding {
                right: offset,
                bottom: offset,
                ..Padding::default()
            },
            TextEffect::Outline { radius } => Padding {
                left: radius,
                top: radius,
                right: radius,
                bottom: radius,
            },
        }
    }
}

/// Fill and effect colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub fill: Color,
    pub effect: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            effect: Color::BLACK.with_alpha(0.75),
        }
    }
}

/// Premultiplied RGBA8 pixels
#[derive(Debug, Clone, PartialEq)]
pub struct TextBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextBitmap {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Single-channel coverage canvas
struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[self.index(x, y)]
    }

    /// Max-blend a glyph bitmap with its top-left corner at `(x0, y0)`
    fn blit(&mut self, bitmap: &[u8], w: u32, h: u32, x0: i32, y0: i32) {
        for gy in 0..h as i32 {
            let y = y0 + gy;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            for gx in 0..w as i32 {
                let x = x0 + gx;
                if x < 0 || x >= self.width as i32 {
                    continue;
                }
                let src = bitmap[gy as usize * w as usize + gx as usize];
                let index = self.index(x, y);
                let dst = &mut self.data[index];
                *dst = (*dst).max(src);
            }
        }
    }

    /// Union of copies of `self` shifted by each offset
    fn spread(&self, offsets: &[(i32, i32)]) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let value = offsets
                    .iter()
                    .map(|(dx, dy)| self.get(x - dx, y - dy))
                    .max()
                    .unwrap_or(0);
                let index = out.index(x, y);
                out.data[index] = value;
            }
        }
        out
    }
}

/// Bitmap side for `extent` pixels of text plus `pad`, at least one pixel
fn bitmap_side(extent: f32, pad: u32) -> Result<u32> {
    let side = (extent.ceil() as u32).saturating_add(pad).max(1);
    if side > MAX_BITMAP_SIDE {
        return Err(TextError::RasterizationFailed(format!(
            "text bitmap side {} exceeds {}",
            side, MAX_BITMAP_SIDE
        )));
    }
    Ok(side)
}

/// Rasterize `layout` into a bitmap sized to the text plus effect padding
///
/// Fails with [`TextError::RasterizationFailed`] when either side would
/// exceed [`MAX_BITMAP_SIDE`].
pub fn compose(
    layout: &TextLayout,
    glyphs: &GlyphSet,
    effect: TextEffect,
    style: &TextStyle,
) -> Result<TextBitmap> {
    let pad = effect.padding();
    let width = bitmap_side(layout.width, pad.horizontal())?;
    let height = bitmap_side(layout.height, pad.vertical())?;

    let mut text = Mask::new(width, height);
    for (row, line) in layout.lines.iter().enumerate() {
        let baseline = pad.top as f32 + row as f32 * layout.line_height + layout.ascent;
        let mut pen = pad.left as f32;
        for ch in line.chars() {
            let glyph = glyphs.glyph(ch);
            if !glyph.bitmap.is_empty() {
                let x0 = pen.round() as i32 + glyph.bearing_x as i32;
                let y0 = baseline.round() as i32 - glyph.bearing_y as i32;
                text.blit(&glyph.bitmap, glyph.width, glyph.height, x0, y0);
            }
            pen += glyph.advance;
        }
    }

    let effect_mask = match effect {
        TextEffect::None => None,
        TextEffect::Shadow { offset } => {
            let o = offset as i32;
            Some(text.spread(&[(o, o)]))
        }
        TextEffect::Outline { radius } => {
            let r = radius as i32;
            Some(text.spread(&[
                (-r, -r),
                (0, -r),
                (r, -r),
                (-r, 0),
                (r, 0),
                (-r, r),
                (0, r),
                (r, r),
            ]))
        }
    };

    let mut pixels = Vec::with_capacity(text.data.len() * 4);
    for (i, &coverage) in text.data.iter().enumerate() {
        let t = coverage as f32 / 255.0 * style.fill.a;
        let s = effect_mask
            .as_ref()
            .map(|m| m.data[i] as f32 / 255.0 * style.effect.a)
            .unwrap_or(0.0);
        let under = s * (1.0 - t);
        let channel = |fill: f32, effect: f32| {
            ((fill * t + effect * under) * 255.0).round().clamp(0.0, 255.0) as u8
        };
        pixels.push(channel(style.fill.r, style.effect.r));
        pixels.push(channel(style.fill.g, style.effect.g));
        pixels.push(channel(style.fill.b, style.effect.b));
        pixels.push(((t + under) * 255.0).round().clamp(0.0, 255.0) as u8);
    }

    Ok(TextBitmap {
        width,
        height,
        pixels,
    })
}
