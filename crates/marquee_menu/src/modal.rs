//! Modal dialog: title, wrapped body text and a row of buttons
//!
//! Opening zooms the window up from slightly smaller while fading it in;
//! closing reverses that.

use crate::frame::{Frame, Visual};
use marquee_animation::{Timing, TransformAnimation, TransformState, TransformTimings};
use marquee_core::{ClockHandle, Color, Rect, Size, Vec2};
use marquee_text::TextEffect;

const CLOSED_ZOOM: f32 = 0.85;
const PADDING: f32 = 40.0;
const BUTTON_HEIGHT: f32 = 56.0;
const BUTTON_GAP: f32 = 24.0;
const WINDOW: Color = Color::rgba(0.1, 0.1, 0.14, 0.95);
const SCRIM: Color = Color::rgba(0.0, 0.0, 0.0, 0.5);
const BUTTON: Color = Color::rgba(1.0, 1.0, 1.0, 0.12);
const BUTTON_FOCUS: Color = Color::rgba(1.0, 1.0, 1.0, 0.9);

pub struct ModalWindow {
    timings: TransformTimings,
    title_height: f32,
    text_height: f32,
    title: String,
    body: String,
    buttons: Vec<String>,
    focused: usize,
    open: bool,
    transform: TransformAnimation,
}

impl ModalWindow {
    pub fn new(
        clock: &ClockHandle,
        timing: Timing,
        size: Size,
        title_height: f32,
        text_height: f32,
    ) -> Self {
        let closed = TransformState::new(Vec2::ZERO, size)
            .with_zoom(CLOSED_ZOOM)
            .with_opacity(0.0);
        Self {
            timings: TransformTimings::uniform(timing),
            title_height,
            text_height,
            title: String::new(),
            body: String::new(),
            buttons: Vec::new(),
            focused: 0,
            open: false,
            transform: TransformAnimation::at_rest(clock, closed),
        }
    }

    pub fn open(&mut self, title: impl Into<String>, body: impl Into<String>, buttons: Vec<String>) {
        self.title = title.into();
        self.body = body.into();
        self.buttons = buttons;
        self.focused = 0;
        self.open = true;
        let to = self.transform.target().with_zoom(1.0).with_opacity(1.0);
        self.transform.retarget(to, self.timings);
    }

    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let to = self
            .transform
            .target()
            .with_zoom(CLOSED_ZOOM)
            .with_opacity(0.0);
        self.transform.retarget(to, self.timings);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Move button focus, wrapping around
    pub fn focus_next(&mut self) {
        if !self.buttons.is_empty() {
            self.focused = (self.focused + 1) % self.buttons.len();
        }
    }

    pub fn focus_previous(&mut self) {
        if !self.buttons.is_empty() {
            self.focused = (self.focused + self.buttons.len() - 1) % self.buttons.len();
        }
    }

    pub fn focused(&self) -> Option<&str> {
        self.buttons.get(self.focused).map(String::as_str)
    }

    pub fn state(&self) -> TransformState {
        self.transform.current()
    }
}

impl Visual for ModalWindow {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let state = self.transform.update();
        if state.opacity <= 0.0 {
            return;
        }
        let viewport = frame.viewport;
        let center = Vec2::new(viewport.width / 2.0, viewport.height / 2.0);
        let window = Rect::centered(center, state.scaled_size());

        frame.draw.push_opacity(state.opacity);
        frame
            .draw
            .fill_rect(Rect::new(0.0, 0.0, viewport.width, viewport.height), 0.0, SCRIM);
        frame.draw.fill_rect(window, 16.0, WINDOW);

        // Text is laid out at full size and only placed by the zoomed window
        let inner_width = state.size.width - PADDING * 2.0;
        let left = window.x() + PADDING * state.zoom;
        let mut y = window.y() + PADDING * state.zoom;
        let effect = TextEffect::None;
        if let Some(size) = frame.label(
            &self.title,
            Vec2::new(left, y),
            Size::new(inner_width, self.title_height),
            effect,
            Color::WHITE,
        ) {
            y += size.height + PADDING / 2.0;
        }
        frame.label(
            &self.body,
            Vec2::new(left, y),
            Size::new(inner_width, self.text_height),
            effect,
            Color::WHITE.with_alpha(0.85),
        );

        if !self.buttons.is_empty() {
            let count = self.buttons.len() as f32;
            let width = ((inner_width - BUTTON_GAP * (count - 1.0)) / count) * state.zoom;
            let top = window.y() + window.height() - (PADDING + BUTTON_HEIGHT) * state.zoom;
            for (index, label) in self.buttons.iter().enumerate() {
                let x = left + index as f32 * (width + BUTTON_GAP * state.zoom);
                let rect = Rect::new(x, top, width, BUTTON_HEIGHT * state.zoom);
                let focused = index == self.focused && self.open;
                let (fill, text) = if focused {
                    (BUTTON_FOCUS, Color::BLACK)
                } else {
                    (BUTTON, Color::WHITE)
                };
                frame.draw.fill_rect(rect, 8.0, fill);
                frame.label_centered(label, rect.center(), Size::new(0.0, self.text_height), effect, text);
            }
        }
        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.transform.is_active()
    }
}
