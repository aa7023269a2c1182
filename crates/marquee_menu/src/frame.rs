//! Per-frame context handed to every controller

use marquee_core::{Color, DrawList, GpuContext, GpuTexture, ProgramId, Rect, Size, Vec2};
use marquee_text::{FontId, TextCache, TextEffect};
use std::time::Duration;

/// Everything a controller needs to record one frame
pub struct Frame<'a> {
    pub now: Duration,
    pub gpu: &'a mut GpuContext,
    pub text: &'a mut TextCache,
    pub draw: &'a mut DrawList,
    /// Font for labels; `None` until the host registers one
    pub font: Option<FontId>,
    /// Program for textured quads; `None` when it failed to compile
    pub image_program: Option<ProgramId>,
    pub viewport: Size,
}

impl Frame<'_> {
    /// Textured quad with the image program; skipped without one
    pub fn image(&mut self, rect: Rect, texture: &GpuTexture, tint: Color) {
        if let Some(program) = self.image_program {
            self.draw.texture(rect, texture.id(), tint, Some(program));
        }
    }

    /// Text with its top-left corner at `origin`
    ///
    /// `bounds.height` picks the pixel size and `bounds.width` the wrap
    /// width. Returns the drawn size, or `None` when nothing was drawn;
    /// cache errors are logged and the draw skipped.
    pub fn label(
        &mut self,
        text: &str,
        origin: Vec2,
        bounds: Size,
        effect: TextEffect,
        color: Color,
    ) -> Option<Size> {
        let font = self.font?;
        let program = self.image_program?;
        let texture = match self.text.get_texture_with(self.gpu, text, bounds, font, effect) {
            Ok(texture) => texture?,
            Err(err) => {
                tracing::warn!("Skipping label {:?}: {}", text, err);
                return None;
            }
        };
        let rect = Rect::from_origin_size(origin, texture.size);
        self.draw.texture(rect, texture.id, color, Some(program));
        Some(texture.size)
    }

    /// Text centered on `center`
    pub fn label_centered(
        &mut self,
        text: &str,
        center: Vec2,
        bounds: Size,
        effect: TextEffect,
        color: Color,
    ) -> Option<Size> {
        let size = self.measure(text, bounds)?;
        let padding = effect.padding();
        let scale = self.text.scale();
        let origin = Vec2::new(
            center.x - (size.width + padding.horizontal() as f32 / scale) / 2.0,
            center.y - (size.height + padding.vertical() as f32 / scale) / 2.0,
        );
        self.label(text, origin, bounds, effect, color)
    }

    /// Text right-aligned to `right`, top at `top`
    pub fn label_right(
        &mut self,
        text: &str,
        right: f32,
        top: f32,
        bounds: Size,
        effect: TextEffect,
        color: Color,
    ) -> Option<Size> {
        let size = self.measure(text, bounds)?;
        let padding = effect.padding().horizontal() as f32 / self.text.scale();
        let origin = Vec2::new(right - size.width - padding, top);
        self.label(text, origin, bounds, effect, color)
    }

    /// Measured size, or `None` when the text cannot be measured
    pub fn measure(&mut self, text: &str, bounds: Size) -> Option<Size> {
        let font = self.font?;
        match self.text.get_text_size(text, bounds, font) {
            Ok(size) => Some(size),
            Err(err) => {
                tracing::warn!("Cannot measure {:?}: {}", text, err);
                None
            }
        }
    }
}

/// A visual element drawn once per frame
pub trait Visual {
    /// Sample animations and record draw commands
    fn render(&mut self, frame: &mut Frame<'_>);

    /// Whether any animation is still running
    fn is_animating(&self) -> bool;
}
