//! Full-screen background with cross-fade

use crate::frame::{Frame, Visual};
use crate::image::Image;
use crate::Result;
use marquee_animation::{Animation, Timing};
use marquee_core::{ClockHandle, Color, GpuContext, GpuTexture, Rect};

pub struct Background {
    clock: ClockHandle,
    timing: Timing,
    current: Option<GpuTexture>,
    previous: Option<GpuTexture>,
    /// 0 shows only `previous`, 1 only `current`
    fade: Animation,
}

impl Background {
    pub fn new(clock: &ClockHandle, timing: Timing) -> Self {
        Self {
            clock: ClockHandle::clone(clock),
            timing,
            current: None,
            previous: None,
            fade: Animation::at_rest(clock, &[1.0]),
        }
    }

    /// Cross-fade to `image`
    pub fn set_image(&mut self, gpu: &mut GpuContext, image: &Image) -> Result<()> {
        let texture = image.upload(gpu, "background")?;
        self.begin_fade(Some(texture));
        Ok(())
    }

    /// Fade the current image out
    pub fn clear(&mut self) {
        self.begin_fade(None);
    }

    fn begin_fade(&mut self, next: Option<GpuTexture>) {
        // Mid-fade, the oldest image is dropped right away
        self.previous = self.current.take();
        self.current = next;
        self.fade = Animation::new(&self.clock, self.timing, &[0.0], &[1.0]);
    }

    pub fn current(&self) -> Option<&GpuTexture> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&GpuTexture> {
        self.previous.as_ref()
    }
}

impl Visual for Background {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let mix = self.fade.update()[0].clamp(0.0, 1.0);
        if !self.fade.is_active() {
            self.previous = None;
        }

        let screen = Rect::new(0.0, 0.0, frame.viewport.width, frame.viewport.height);
        if let Some(previous) = &self.previous {
            frame.image(screen, previous, Color::WHITE.with_alpha(1.0 - mix));
        }
        if let Some(current) = &self.current {
            frame.image(screen, current, Color::WHITE.with_alpha(mix));
        }
    }

    fn is_animating(&self) -> bool {
        self.fade.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use marquee_animation::EasingCurve;
    use marquee_core::DrawCommand;

    fn alphas(commands: &[DrawCommand]) -> Vec<f32> {
        commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Texture { tint, .. } => Some(tint.a),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cross_fade_then_release_previous() {
        let mut h = Harness::new();
        let mut background = Background::new(&h.clock.handle(), Timing::new(600, EasingCurve::Linear));

        let red = Image::solid(2, 2, Color::rgb(1.0, 0.0, 0.0)).unwrap();
        let blue = Image::solid(2, 2, Color::rgb(0.0, 0.0, 1.0)).unwrap();
        background.set_image(&mut h.gpu, &red).unwrap();
        h.clock.set_ms(600);
        assert_eq!(alphas(&h.render(&mut background)), vec![1.0]);

        background.set_image(&mut h.gpu, &blue).unwrap();
        h.clock.set_ms(900);
        assert_eq!(alphas(&h.render(&mut background)), vec![0.5, 0.5]);
        assert!(background.is_animating());

        h.clock.set_ms(1200);
        assert_eq!(alphas(&h.render(&mut background)), vec![1.0]);
        assert!(background.previous().is_none());
        h.gpu.flush_releases();
        assert_eq!(h.probe.live_textures(), 1);
    }

    #[test]
    fn test_clear_fades_out() {
        let mut h = Harness::new();
        let mut background = Background::new(&h.clock.handle(), Timing::new(100, EasingCurve::Linear));
        let image = Image::solid(2, 2, Color::WHITE).unwrap();
        background.set_image(&mut h.gpu, &image).unwrap();
        h.clock.set_ms(100);
        h.render(&mut background);

        background.clear();
        h.clock.set_ms(150);
        assert_eq!(alphas(&h.render(&mut background)), vec![0.5]);
        h.clock.set_ms(200);
        assert!(h.render(&mut background).is_empty());
        assert!(background.current().is_none());
    }
}
