//! Subtitle line at the bottom of the screen, outlined for legibility

use crate::frame::{Frame, Visual};
use marquee_animation::{Animation, Timing};
use marquee_core::{ClockHandle, Color, Size, Vec2};

const BOTTOM_MARGIN: f32 = 96.0;

pub struct Subtitles {
    clock: ClockHandle,
    timing: Timing,
    text_height: f32,
    /// Kept while fading out
    text: String,
    showing: bool,
    fade: Animation,
}

impl Subtitles {
    pub fn new(clock: &ClockHandle, timing: Timing, text_height: f32) -> Self {
        Self {
            clock: ClockHandle::clone(clock),
            timing,
            text_height,
            text: String::new(),
            showing: false,
            fade: Animation::at_rest(clock, &[0.0]),
        }
    }

    /// Show `text`, or fade out with `None`
    pub fn set(&mut self, text: Option<&str>) {
        match text {
            Some(text) if !text.is_empty() => {
                self.text = text.to_string();
                if !self.showing {
                    self.showing = true;
                    self.fade_to(1.0);
                }
            }
            _ => {
                if self.showing {
                    self.showing = false;
                    self.fade_to(0.0);
                }
            }
        }
    }

    fn fade_to(&mut self, opacity: f32) {
        let from = self.fade.current()[0];
        self.fade = Animation::new(&self.clock, self.timing, &[from], &[opacity]);
    }

    pub fn text(&self) -> Option<&str> {
        self.showing.then_some(self.text.as_str())
    }
}

impl Visual for Subtitles {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let opacity = self.fade.update()[0];
        if opacity <= 0.0 {
            if !self.showing {
                self.text.clear();
            }
            return;
        }
        let viewport = frame.viewport;
        let bounds = Size::new(viewport.width * 0.8, self.text_height);
        let Some(size) = frame.measure(&self.text, bounds) else {
            return;
        };
        let center = Vec2::new(
            viewport.width / 2.0,
            viewport.height - BOTTOM_MARGIN - size.height / 2.0,
        );
        let outline = frame.text.outline();
        frame.draw.push_opacity(opacity);
        frame.label_centered(&self.text, center, bounds, outline, Color::WHITE);
        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.fade.is_active()
    }
}
