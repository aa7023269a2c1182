//! Host-supplied RGBA images

use crate::{MenuError, Result};
use marquee_core::{Color, GpuContext, GpuTexture, TextureDescriptor, TextureFormat};

/// Straight RGBA8 pixels, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(MenuError::ImageSize {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color image, handy for placeholders
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self> {
        let texel = color.to_rgba8();
        let count = width as usize * height as usize;
        Self::new(width, height, texel.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Create a texture holding this image
    pub fn upload(&self, gpu: &mut GpuContext, label: &str) -> Result<GpuTexture> {
        let desc = TextureDescriptor::new(label, self.width, self.height, TextureFormat::Rgba8);
        Ok(gpu.create_texture_with_data(&desc, &self.pixels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_checked() {
        assert!(Image::new(2, 2, vec![0; 16]).is_ok());
        let err = Image::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, MenuError::ImageSize { actual: 15, .. }));
        assert!(Image::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_solid_fills_every_texel() {
        let image = Image::solid(3, 1, Color::rgb(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(image.pixels(), &[255, 0, 0, 255, 255, 0, 0, 255, 255, 0, 0, 255]);
    }
}
